use crate::apply::RenamePolicy;
use crate::cleanup::{CleanupConfig, CleanupPipeline};
use crate::conflict::{detect_conflicts, ConflictKind};
use crate::discover::{filter_by_extension, scan_directory, ScanStats};
use crate::record::FileRecord;
use crate::sort::{sort_records, SortStrategy};
use crate::template::{synthesize, SynthesisOptions};
use crate::DEFAULT_TEMPLATE;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub directory: PathBuf,
    /// カンマ区切りの拡張子フィルタ。空なら全ファイル対象。
    pub extension_filter: String,
    pub sort: SortStrategy,
    pub template: String,
    pub start_index: u32,
    pub index_digits: usize,
    pub cleanup: CleanupConfig,
    pub policy: RenamePolicy,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            extension_filter: String::new(),
            sort: SortStrategy::NameAsc,
            template: DEFAULT_TEMPLATE.to_string(),
            start_index: 1,
            index_digits: 3,
            cleanup: CleanupConfig::default(),
            policy: RenamePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameEntry {
    pub record: FileRecord,
    pub new_name: String,
    pub conflict: Option<ConflictKind>,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanStats {
    pub scan: ScanStats,
    pub planned: usize,
    pub conflicts: usize,
    /// コンパイルできず捨てた清掃ルール行の数
    pub skipped_cleanup_rules: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub directory: PathBuf,
    pub entries: Vec<RenameEntry>,
    pub stats: PlanStats,
}

impl RenamePlan {
    pub fn conflict_count(&self) -> usize {
        self.entries.iter().filter(|e| e.conflict.is_some()).count()
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.selected).count()
    }
}

/// 現在の設定からプランを丸ごと作り直す。差分更新はしない
/// (設定変更のたびに全体を再計算して、常に設定と整合した並びを保証する)。
/// エントリの並びがそのまま実行順になる。
pub fn generate_plan(options: &PlanOptions) -> Result<RenamePlan> {
    if !options.directory.exists() {
        anyhow::bail!("対象フォルダが存在しません: {}", options.directory.display());
    }

    let mut stats = PlanStats::default();
    let all = scan_directory(&options.directory, &mut stats.scan)?;

    // 衝突判定用の「ディスク上の既存名」はフィルタ前の全ファイル
    let existing: Vec<String> = all.iter().map(|r| r.file_name.clone()).collect();

    let mut records = filter_by_extension(all, &options.extension_filter, &mut stats.scan);
    sort_records(&mut records, options.sort);

    let pipeline = CleanupPipeline::build(&options.cleanup);
    stats.skipped_cleanup_rules = pipeline.skipped_rules();

    let template = if options.template.trim().is_empty() {
        DEFAULT_TEMPLATE
    } else {
        options.template.as_str()
    };
    let synth = SynthesisOptions {
        start_index: options.start_index,
        index_digits: options.index_digits,
        keep_extension: options.policy.keep_extension,
    };

    let mut new_names = Vec::with_capacity(records.len());
    for (ordinal, record) in records.iter().enumerate() {
        let cleaned = pipeline.clean(&record.stem);
        new_names.push(synthesize(record, &cleaned, ordinal, template, &synth));
    }

    let sources: Vec<String> = records.iter().map(|r| r.file_name.clone()).collect();
    let conflicts = detect_conflicts(
        &new_names,
        &sources,
        &existing,
        options.policy.case_sensitive,
        options.policy.overwrite_existing,
    );

    let entries: Vec<RenameEntry> = records
        .into_iter()
        .zip(new_names)
        .enumerate()
        .map(|(index, (record, new_name))| RenameEntry {
            record,
            new_name,
            conflict: conflicts.get(&index).copied(),
            selected: true,
        })
        .collect();

    stats.planned = entries.len();
    stats.conflicts = conflicts.len();

    Ok(RenamePlan {
        directory: options.directory.clone(),
        entries,
        stats,
    })
}
