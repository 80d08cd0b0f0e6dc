use crate::record::FileRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub scanned_entries: usize,
    pub skipped_non_regular: usize,
    pub filtered_out: usize,
}

/// 対象フォルダ直下の通常ファイルを列挙する(非再帰)。
/// フォルダ自体が読めない場合のみエラー。サブフォルダ等はスキップ。
pub fn scan_directory(root: &Path, stats: &mut ScanStats) -> Result<Vec<FileRecord>> {
    let mut out = Vec::new();

    for entry in
        fs::read_dir(root).with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
    {
        let entry = entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
        stats.scanned_entries += 1;

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_) => {
                stats.skipped_non_regular += 1;
                continue;
            }
        };
        if !meta.is_file() {
            stats.skipped_non_regular += 1;
            continue;
        }

        out.push(FileRecord::from_metadata(&entry.path(), &meta));
    }

    // read_dirの列挙順はOS依存なので、走査順を決定的にしておく
    out.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(out)
}

/// カンマ区切りの拡張子リストを正規化する。空要素は捨て、先頭ドットは補う。
pub fn parse_extension_filter(text: &str) -> Vec<String> {
    text.split(',')
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .map(|v| if v.starts_with('.') { v } else { format!(".{v}") })
        .collect()
}

/// 拡張子フィルタを適用する。リストが空なら全件通す。
/// 比較は常に大文字小文字を無視する(case_sensitiveは衝突判定専用)。
pub fn filter_by_extension(
    records: Vec<FileRecord>,
    filter_text: &str,
    stats: &mut ScanStats,
) -> Vec<FileRecord> {
    let wanted = parse_extension_filter(filter_text);
    if wanted.is_empty() {
        return records;
    }

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if wanted.contains(&record.extension.to_lowercase()) {
            out.push(record);
        } else {
            stats.filtered_out += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{filter_by_extension, parse_extension_filter, scan_directory, ScanStats};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn scan_lists_regular_files_and_skips_directories() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.jpg"), b"b").expect("write b");
        fs::create_dir(temp.path().join("nested")).expect("create nested");

        let mut stats = ScanStats::default();
        let records = scan_directory(temp.path(), &mut stats).expect("scan");

        let names: Vec<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.jpg"]);
        assert_eq!(stats.scanned_entries, 3);
        assert_eq!(stats.skipped_non_regular, 1);
    }

    #[test]
    fn scan_fails_for_missing_directory() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("nope");

        let mut stats = ScanStats::default();
        let err = scan_directory(&missing, &mut stats).expect_err("must fail");
        assert!(err.to_string().contains("フォルダを読めませんでした"));
    }

    #[test]
    fn extension_filter_is_trimmed_and_dot_optional() {
        assert_eq!(parse_extension_filter(" jpg , .PNG ,,txt"), vec![
            ".jpg".to_string(),
            ".png".to_string(),
            ".txt".to_string()
        ]);
        assert!(parse_extension_filter("  ").is_empty());
    }

    #[test]
    fn filter_matches_case_insensitively_and_empty_passes_all() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.JPG"), b"a").expect("write a");
        fs::write(temp.path().join("b.png"), b"b").expect("write b");
        fs::write(temp.path().join("c.txt"), b"c").expect("write c");

        let mut stats = ScanStats::default();
        let records = scan_directory(temp.path(), &mut stats).expect("scan");

        let all = filter_by_extension(records.clone(), "", &mut stats);
        assert_eq!(all.len(), 3);

        let filtered = filter_by_extension(records, "jpg,.PNG", &mut stats);
        let names: Vec<&str> = filtered.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
        assert_eq!(stats.filtered_out, 1);
    }
}
