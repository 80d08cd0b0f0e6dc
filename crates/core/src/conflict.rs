use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// プラン内で同じ新名称に解決されたエントリ同士。上書き設定に関係なく検出。
    Duplicate,
    /// ディスク上の既存ファイル(プランの元ファイルを除く)と同名。
    /// 上書きが許可されている場合は検出しない。
    ExistsOnDisk,
}

/// 新名称の衝突を検出し、エントリ番号ごとの衝突種別を返す。
/// プラン時の参考情報であり、実行直前に必ず再計算すること。
pub fn detect_conflicts(
    new_names: &[String],
    source_names: &[String],
    existing_names: &[String],
    case_sensitive: bool,
    overwrite_allowed: bool,
) -> HashMap<usize, ConflictKind> {
    let fold = |name: &str| -> String {
        if case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    };

    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, name) in new_names.iter().enumerate() {
        groups.entry(fold(name)).or_default().push(index);
    }

    let sources: HashSet<String> = source_names.iter().map(|v| fold(v)).collect();
    let existing: HashSet<String> = existing_names.iter().map(|v| fold(v)).collect();

    let mut conflicts = HashMap::new();
    for (name, indices) in groups {
        if indices.len() > 1 {
            for index in indices {
                conflicts.insert(index, ConflictKind::Duplicate);
            }
        } else if !overwrite_allowed && existing.contains(&name) && !sources.contains(&name) {
            conflicts.insert(indices[0], ConflictKind::ExistsOnDisk);
        }
    }
    conflicts
}
