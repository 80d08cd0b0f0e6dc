use crate::planner::{RenameEntry, RenamePlan};
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenamePolicy {
    pub backup_original: bool,
    pub overwrite_existing: bool,
    pub keep_extension: bool,
    pub case_sensitive: bool,
}

impl Default for RenamePolicy {
    fn default() -> Self {
        Self {
            backup_original: false,
            overwrite_existing: false,
            keep_extension: true,
            case_sensitive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<RenameFailure>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub message: String,
}

/// ファイル間で協調的にチェックされる中断フラグ。処理中のファイルは
/// 最後まで完了させ、次のファイルに進む前に停止する。
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Progress(ProgressEvent),
    Done(ExecutionResult),
}

pub fn apply_plan(
    plan: &RenamePlan,
    policy: &RenamePolicy,
    progress: &mut dyn FnMut(ProgressEvent),
) -> ExecutionResult {
    apply_plan_with_cancel(plan, policy, &CancelToken::new(), progress)
}

/// 選択済みエントリをプラン順に1件ずつ処理する。同一フォルダ内のリネームは
/// 順序依存(連番付与・バックアップ名の探索)なので並列化しない。
/// 1件の失敗はそのファイルの失敗として記録し、バッチは続行する。
pub fn apply_plan_with_cancel(
    plan: &RenamePlan,
    policy: &RenamePolicy,
    token: &CancelToken,
    progress: &mut dyn FnMut(ProgressEvent),
) -> ExecutionResult {
    let selected: Vec<&RenameEntry> = plan.entries.iter().filter(|e| e.selected).collect();
    let total = selected.len();
    let mut result = ExecutionResult::default();
    if total == 0 {
        return result;
    }

    for (done, entry) in selected.iter().enumerate() {
        if token.is_cancelled() {
            result.cancelled = true;
            break;
        }

        result.attempted += 1;
        match rename_entry(entry, &plan.directory, policy) {
            Ok(()) => result.succeeded += 1,
            Err(err) => result.failures.push(RenameFailure {
                path: entry.record.path.clone(),
                reason: format!("{err:#}"),
            }),
        }

        // 成否に関わらず1件ごとに進捗を出す
        let percent = (((done + 1) as f64 / total as f64) * 100.0).round() as u8;
        progress(ProgressEvent {
            percent,
            message: format!("リネーム中: {}", entry.new_name),
        });
    }

    result
}

/// 実行をバックグラウンドの1ワーカーに逃がし、進捗と完了をチャネルで返す。
/// 呼び出し側は受信側を好きなタイミングで消化すればよい。
pub fn apply_plan_in_background(
    plan: RenamePlan,
    policy: RenamePolicy,
    token: CancelToken,
) -> Receiver<WorkerMessage> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let progress_tx = tx.clone();
        let result = apply_plan_with_cancel(&plan, &policy, &token, &mut |event| {
            let _ = progress_tx.send(WorkerMessage::Progress(event));
        });
        let _ = tx.send(WorkerMessage::Done(result));
    });
    rx
}

fn rename_entry(entry: &RenameEntry, target_dir: &Path, policy: &RenamePolicy) -> Result<()> {
    let source = entry.record.path.as_path();

    // バックアップはリネームより先。コピーに失敗したらこのファイルは諦める。
    if policy.backup_original && source.exists() {
        let backup = backup_path_for(source);
        fs::copy(source, &backup).with_context(|| {
            format!(
                "バックアップに失敗しました: {} -> {}",
                source.display(),
                backup.display()
            )
        })?;
    }

    let mut target = target_dir.join(&entry.new_name);
    if policy.overwrite_existing {
        if target.exists() && target != source {
            fs::remove_file(&target).with_context(|| {
                format!("既存ファイルを削除できませんでした: {}", target.display())
            })?;
        }
    } else {
        target = resolve_auto_suffix(target, source);
    }

    // 解決後の行き先が自分自身なら何もしない(成功扱い)
    if target == source {
        return Ok(());
    }

    fs::rename(source, &target).with_context(|| {
        format!(
            "リネームに失敗しました: {} -> {}",
            source.display(),
            target.display()
        )
    })?;
    Ok(())
}

/// `<stem>_backup<ext>` を試し、埋まっていれば `_backup_1`, `_backup_2`, …
fn backup_path_for(source: &Path) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let ext = source
        .extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default();

    let candidate = parent.join(format!("{stem}_backup{ext}"));
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1usize;
    loop {
        let candidate = parent.join(format!("{stem}_backup_{n}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// 上書き禁止時の衝突回避: 行き先が既に存在し自分自身でもなければ
/// `_1`, `_2`, … を付けて空きを探す。
fn resolve_auto_suffix(target: PathBuf, source: &Path) -> PathBuf {
    if !target.exists() || target == source {
        return target;
    }

    let parent = target.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let stem = target
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let ext = target
        .extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1usize;
    loop {
        let candidate = parent.join(format!("{stem}_{n}{ext}"));
        if !candidate.exists() || candidate == source {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        apply_plan, apply_plan_in_background, apply_plan_with_cancel, backup_path_for,
        resolve_auto_suffix, CancelToken, RenamePolicy, WorkerMessage,
    };
    use crate::planner::{PlanStats, RenameEntry, RenamePlan};
    use crate::record::FileRecord;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn entry(dir: &Path, file_name: &str, new_name: &str) -> RenameEntry {
        let path = dir.join(file_name);
        let meta = fs::metadata(&path).expect("metadata");
        RenameEntry {
            record: FileRecord::from_metadata(&path, &meta),
            new_name: new_name.to_string(),
            conflict: None,
            selected: true,
        }
    }

    fn plan(dir: &Path, entries: Vec<RenameEntry>) -> RenamePlan {
        RenamePlan {
            directory: dir.to_path_buf(),
            entries,
            stats: PlanStats::default(),
        }
    }

    #[test]
    fn renames_files_and_reports_full_success() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let plan = plan(
            temp.path(),
            vec![
                entry(temp.path(), "a.txt", "first.txt"),
                entry(temp.path(), "b.txt", "second.txt"),
            ],
        );

        let mut events = Vec::new();
        let result = apply_plan(&plan, &RenamePolicy::default(), &mut |e| events.push(e));

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 2);
        assert!(result.failures.is_empty());
        assert!(temp.path().join("first.txt").exists());
        assert!(temp.path().join("second.txt").exists());

        let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
        assert_eq!(percents, vec![50, 100]);
    }

    #[test]
    fn existing_target_gets_numeric_suffix_when_overwrite_is_off() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("src.txt"), b"new").expect("write src");
        fs::write(temp.path().join("taken.txt"), b"old").expect("write taken");
        fs::write(temp.path().join("taken_1.txt"), b"old1").expect("write taken_1");

        let plan = plan(temp.path(), vec![entry(temp.path(), "src.txt", "taken.txt")]);
        let result = apply_plan(&plan, &RenamePolicy::default(), &mut |_| {});

        assert_eq!(result.succeeded, 1);
        assert_eq!(
            fs::read(temp.path().join("taken.txt")).expect("read"),
            b"old"
        );
        assert_eq!(
            fs::read(temp.path().join("taken_2.txt")).expect("read"),
            b"new"
        );
    }

    #[test]
    fn overwrite_replaces_the_existing_target() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("src.txt"), b"new").expect("write src");
        fs::write(temp.path().join("taken.txt"), b"old").expect("write taken");

        let plan = plan(temp.path(), vec![entry(temp.path(), "src.txt", "taken.txt")]);
        let policy = RenamePolicy {
            overwrite_existing: true,
            ..RenamePolicy::default()
        };
        let result = apply_plan(&plan, &policy, &mut |_| {});

        assert_eq!(result.succeeded, 1);
        assert!(!temp.path().join("src.txt").exists());
        assert_eq!(
            fs::read(temp.path().join("taken.txt")).expect("read"),
            b"new"
        );
    }

    #[test]
    fn backup_copy_exists_before_target_is_touched() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("photo.jpg"), b"pixels").expect("write");

        let plan = plan(
            temp.path(),
            vec![entry(temp.path(), "photo.jpg", "renamed.jpg")],
        );
        let policy = RenamePolicy {
            backup_original: true,
            ..RenamePolicy::default()
        };
        let result = apply_plan(&plan, &policy, &mut |_| {});

        assert_eq!(result.succeeded, 1);
        assert!(temp.path().join("renamed.jpg").exists());
        assert_eq!(
            fs::read(temp.path().join("photo_backup.jpg")).expect("read backup"),
            b"pixels"
        );
    }

    #[test]
    fn backup_name_probes_numbered_slots() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("photo.jpg"), b"x").expect("write");
        fs::write(temp.path().join("photo_backup.jpg"), b"x").expect("write backup");
        fs::write(temp.path().join("photo_backup_1.jpg"), b"x").expect("write backup 1");

        let resolved = backup_path_for(&temp.path().join("photo.jpg"));
        assert_eq!(
            resolved.file_name().and_then(|v| v.to_str()),
            Some("photo_backup_2.jpg")
        );
    }

    #[test]
    fn rename_to_own_name_is_a_successful_no_op() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("keep.txt"), b"k").expect("write");

        let plan = plan(temp.path(), vec![entry(temp.path(), "keep.txt", "keep.txt")]);
        let result = apply_plan(&plan, &RenamePolicy::default(), &mut |_| {});

        assert_eq!(result.attempted, 1);
        assert_eq!(result.succeeded, 1);
        assert!(temp.path().join("keep.txt").exists());
    }

    #[test]
    fn auto_suffix_keeps_own_path_without_probing() {
        let temp = tempdir().expect("tempdir");
        let own = temp.path().join("same.txt");
        fs::write(&own, b"x").expect("write");

        assert_eq!(resolve_auto_suffix(own.clone(), &own), own);
    }

    #[test]
    fn single_failure_does_not_abort_the_batch() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let broken = entry(temp.path(), "a.txt", "a_new.txt");
        fs::remove_file(temp.path().join("a.txt")).expect("remove a");

        let plan = plan(
            temp.path(),
            vec![broken, entry(temp.path(), "b.txt", "b_new.txt")],
        );
        let mut events = Vec::new();
        let result = apply_plan(&plan, &RenamePolicy::default(), &mut |e| events.push(e));

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].reason.contains("リネームに失敗しました"));
        assert!(temp.path().join("b_new.txt").exists());
        // 失敗したファイルでも進捗は出る
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn unselected_entries_are_skipped() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let mut skipped = entry(temp.path(), "a.txt", "a_new.txt");
        skipped.selected = false;
        let plan = plan(
            temp.path(),
            vec![skipped, entry(temp.path(), "b.txt", "b_new.txt")],
        );
        let result = apply_plan(&plan, &RenamePolicy::default(), &mut |_| {});

        assert_eq!(result.attempted, 1);
        assert!(temp.path().join("a.txt").exists());
        assert!(temp.path().join("b_new.txt").exists());
    }

    #[test]
    fn cancellation_stops_between_files() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let plan = plan(
            temp.path(),
            vec![
                entry(temp.path(), "a.txt", "a_new.txt"),
                entry(temp.path(), "b.txt", "b_new.txt"),
            ],
        );

        let token = CancelToken::new();
        let cancel_after_first = token.clone();
        let result = apply_plan_with_cancel(
            &plan,
            &RenamePolicy::default(),
            &token,
            &mut move |_event| cancel_after_first.cancel(),
        );

        assert!(result.cancelled);
        assert_eq!(result.attempted, 1);
        assert_eq!(result.succeeded, 1);
        assert!(temp.path().join("a_new.txt").exists());
        assert!(temp.path().join("b.txt").exists());
    }

    #[test]
    fn background_worker_streams_progress_then_done() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");

        let plan = plan(temp.path(), vec![entry(temp.path(), "a.txt", "done.txt")]);
        let rx = apply_plan_in_background(plan, RenamePolicy::default(), CancelToken::new());

        let mut saw_progress = false;
        let mut final_result = None;
        for message in rx {
            match message {
                WorkerMessage::Progress(event) => {
                    saw_progress = true;
                    assert_eq!(event.percent, 100);
                }
                WorkerMessage::Done(result) => final_result = Some(result),
            }
        }

        assert!(saw_progress);
        let result = final_result.expect("done message");
        assert_eq!(result.succeeded, 1);
        assert!(temp.path().join("done.txt").exists());
    }
}
