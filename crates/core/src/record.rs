use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Immutable snapshot of one file, taken once per scan. A plan built
/// from these records is superseded by a fresh scan after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    pub stem: String,
    /// Extension including the leading dot; empty when the file has none.
    pub extension: String,
    pub size: u64,
    pub modified: DateTime<Local>,
    pub created: DateTime<Local>,
    pub parent_name: String,
}

impl FileRecord {
    pub fn from_metadata(path: &Path, meta: &fs::Metadata) -> Self {
        let file_name = path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let stem = path
            .file_stem()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let extension = path
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default();
        let parent_name = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();

        let modified = meta
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Local::now());
        // 作成日時が取れないファイルシステムでは更新日時で代用する
        let created = meta.created().map(DateTime::from).unwrap_or(modified);

        Self {
            path: path.to_path_buf(),
            file_name,
            stem,
            extension,
            size: meta.len(),
            modified,
            created,
            parent_name,
        }
    }
}
