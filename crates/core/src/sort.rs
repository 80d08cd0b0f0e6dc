use crate::record::FileRecord;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// 並び替え戦略。Randomを除き安定ソート(同順位は走査順を維持)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortStrategy {
    MtimeDesc,
    MtimeAsc,
    CtimeDesc,
    CtimeAsc,
    NameAsc,
    NameDesc,
    NameNumeric,
    NameNatural,
    SizeDesc,
    SizeAsc,
    TypeAsc,
    TypeDesc,
    // Type系と同義。UI上は「拡張子」として別項目だった経緯を引き継ぐ。
    ExtensionAsc,
    ExtensionDesc,
    Random,
}

impl SortStrategy {
    pub const ALL: &'static [SortStrategy] = &[
        SortStrategy::MtimeDesc,
        SortStrategy::MtimeAsc,
        SortStrategy::CtimeDesc,
        SortStrategy::CtimeAsc,
        SortStrategy::NameAsc,
        SortStrategy::NameDesc,
        SortStrategy::NameNumeric,
        SortStrategy::NameNatural,
        SortStrategy::SizeDesc,
        SortStrategy::SizeAsc,
        SortStrategy::TypeAsc,
        SortStrategy::TypeDesc,
        SortStrategy::ExtensionAsc,
        SortStrategy::ExtensionDesc,
        SortStrategy::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortStrategy::MtimeDesc => "mtime-desc",
            SortStrategy::MtimeAsc => "mtime-asc",
            SortStrategy::CtimeDesc => "ctime-desc",
            SortStrategy::CtimeAsc => "ctime-asc",
            SortStrategy::NameAsc => "name-asc",
            SortStrategy::NameDesc => "name-desc",
            SortStrategy::NameNumeric => "name-numeric",
            SortStrategy::NameNatural => "name-natural",
            SortStrategy::SizeDesc => "size-desc",
            SortStrategy::SizeAsc => "size-asc",
            SortStrategy::TypeAsc => "type-asc",
            SortStrategy::TypeDesc => "type-desc",
            SortStrategy::ExtensionAsc => "extension-asc",
            SortStrategy::ExtensionDesc => "extension-desc",
            SortStrategy::Random => "random",
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortStrategy::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("未対応の並び替え指定です: {s}"))
    }
}

pub fn sort_records(records: &mut [FileRecord], strategy: SortStrategy) {
    match strategy {
        SortStrategy::MtimeDesc => records.sort_by_key(|r| Reverse(r.modified)),
        SortStrategy::MtimeAsc => records.sort_by_key(|r| r.modified),
        SortStrategy::CtimeDesc => records.sort_by_key(|r| Reverse(r.created)),
        SortStrategy::CtimeAsc => records.sort_by_key(|r| r.created),
        SortStrategy::NameAsc => records.sort_by_cached_key(|r| r.file_name.to_lowercase()),
        SortStrategy::NameDesc => {
            records.sort_by_cached_key(|r| Reverse(r.file_name.to_lowercase()))
        }
        SortStrategy::NameNumeric => records.sort_by_cached_key(|r| numeric_key(&r.file_name)),
        SortStrategy::NameNatural => records.sort_by_cached_key(|r| natural_key(&r.file_name)),
        SortStrategy::SizeDesc => records.sort_by_key(|r| Reverse(r.size)),
        SortStrategy::SizeAsc => records.sort_by_key(|r| r.size),
        SortStrategy::TypeAsc | SortStrategy::ExtensionAsc => {
            records.sort_by_cached_key(|r| r.extension.to_lowercase())
        }
        SortStrategy::TypeDesc | SortStrategy::ExtensionDesc => {
            records.sort_by_cached_key(|r| Reverse(r.extension.to_lowercase()))
        }
        // 再現性なし(シードなしシャッフル)。仕様上の非決定ポイント。
        SortStrategy::Random => records.shuffle(&mut rand::thread_rng()),
    }
}

/// ファイル名中の数字列を順に整数として取り出す。数字がなければ[0]。
fn numeric_key(name: &str) -> Vec<u64> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for ch in name.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            runs.push(parse_digit_run(&current));
            current.clear();
        }
    }
    if !current.is_empty() {
        runs.push(parse_digit_run(&current));
    }
    if runs.is_empty() {
        runs.push(0);
    }
    runs
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalPiece {
    Number(u64),
    Text(String),
}

/// 自然順キー: テキストと数字の交互の並びに分解し、数字は数値として比較する。
fn natural_key(name: &str) -> Vec<NaturalPiece> {
    let lower = name.to_lowercase();
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for ch in lower.chars() {
        if ch.is_ascii_digit() {
            if !text.is_empty() {
                pieces.push(NaturalPiece::Text(std::mem::take(&mut text)));
            }
            digits.push(ch);
        } else {
            if !digits.is_empty() {
                pieces.push(NaturalPiece::Number(parse_digit_run(&digits)));
                digits.clear();
            }
            text.push(ch);
        }
    }
    if !digits.is_empty() {
        pieces.push(NaturalPiece::Number(parse_digit_run(&digits)));
    }
    if !text.is_empty() {
        pieces.push(NaturalPiece::Text(text));
    }
    pieces
}

fn parse_digit_run(run: &str) -> u64 {
    run.parse().unwrap_or(u64::MAX)
}
