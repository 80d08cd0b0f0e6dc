use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 標準の「スマート清掃」パターン。クラウドサービス名やダウンロード痕跡を
/// 大文字小文字無視の正規表現で除去する。ロジックではなくデータとして持ち、
/// 設定ファイルから差し替えられる。
pub const DEFAULT_SMART_PATTERNS: &[&str] = &[
    // クラウドストレージ系のタグ
    r"百度网盘.*?[-_]?",
    r"阿里云盘.*?[-_]?",
    r"腾讯微云.*?[-_]?",
    r"夸克网盘.*?[-_]?",
    r"蓝奏云.*?[-_]?",
    r"OneDrive.*?[-_]?",
    r"Google.*?Drive.*?[-_]?",
    r"Dropbox.*?[-_]?",
    r"iCloud.*?[-_]?",
    r"115网盘.*?[-_]?",
    r"天翼云盘.*?[-_]?",
    r"和彩云.*?[-_]?",
    // ダウンロード・コピー痕跡
    r"[-_]?下载.*",
    r"[-_]?副本\d*",
    r"[-_]?拷贝\d*",
    r"[-_]?copy\d*",
    r"\(\d+\)$",
    r"[-_]\d+$",
    r"新建.*",
    r"untitled.*",
    // 括弧付きダウンロードマーカー
    r"\[.*?下载.*?\]",
    r"【.*?下载.*?】",
    // 連続セパレータ
    r"[-_]{2,}",
    r"^[-_]+|[-_]+$",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupMode {
    Smart,
    CustomLiteral,
    CustomRegex,
}

impl CleanupMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CleanupMode::Smart => "smart",
            CleanupMode::CustomLiteral => "literal",
            CleanupMode::CustomRegex => "regex",
        }
    }
}

impl fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smart" => Ok(CleanupMode::Smart),
            "literal" | "custom-literal" => Ok(CleanupMode::CustomLiteral),
            "regex" | "custom-regex" => Ok(CleanupMode::CustomRegex),
            other => Err(format!("未対応の清掃モードです: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub enabled: bool,
    pub mode: CleanupMode,
    /// 1行1ルール。literal/regexモードで使う。
    pub rules_text: String,
    pub smart_patterns: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: CleanupMode::Smart,
            rules_text: String::new(),
            smart_patterns: DEFAULT_SMART_PATTERNS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

enum CompiledRules {
    Disabled,
    Smart(Vec<Regex>),
    Literal(Vec<String>),
    Regexes(Vec<Regex>),
}

/// プラン生成時に一度だけ構築する清掃パイプライン。
/// コンパイルに失敗したルール行はその行だけ捨て、残りは生かす。
pub struct CleanupPipeline {
    rules: CompiledRules,
    skipped_rules: usize,
    ws_run: Regex,
    sep_run: Regex,
    edge_trim: Regex,
}

impl CleanupPipeline {
    pub fn build(config: &CleanupConfig) -> Self {
        let mut skipped = 0usize;
        let rules = if !config.enabled {
            CompiledRules::Disabled
        } else {
            match config.mode {
                CleanupMode::Smart => CompiledRules::Smart(compile_lines(
                    config.smart_patterns.iter().map(String::as_str),
                    &mut skipped,
                )),
                CleanupMode::CustomLiteral => CompiledRules::Literal(
                    config
                        .rules_text
                        .lines()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                CleanupMode::CustomRegex => {
                    CompiledRules::Regexes(compile_lines(config.rules_text.lines(), &mut skipped))
                }
            }
        };

        Self {
            rules,
            skipped_rules: skipped,
            ws_run: Regex::new(r"\s+").expect("固定パターン"),
            sep_run: Regex::new(r"[-_]{2,}").expect("固定パターン"),
            edge_trim: Regex::new(r"^[-_\s]+|[-_\s]+$").expect("固定パターン"),
        }
    }

    /// コンパイルできず読み飛ばしたルール行の数。
    pub fn skipped_rules(&self) -> usize {
        self.skipped_rules
    }

    /// stemを清掃して返す。無効時はそのまま。結果が2文字未満に潰れた場合は
    /// 元のstemを返す(清掃で名前が消えてはならない)。
    pub fn clean(&self, stem: &str) -> String {
        let mut out = match &self.rules {
            CompiledRules::Disabled => return stem.to_string(),
            CompiledRules::Smart(regexes) => {
                let mut value = stem.to_string();
                for re in regexes {
                    value = re.replace_all(&value, "").into_owned();
                }
                strip_repeated_words(&value)
            }
            CompiledRules::Literal(rules) => {
                let mut value = stem.to_string();
                for rule in rules {
                    value = value.replace(rule.as_str(), "");
                }
                value
            }
            CompiledRules::Regexes(regexes) => {
                let mut value = stem.to_string();
                for re in regexes {
                    value = re.replace_all(&value, "").into_owned();
                }
                value
            }
        };

        out = self.post_process(&out);
        if out.chars().count() < 2 {
            return stem.to_string();
        }
        out
    }

    fn post_process(&self, value: &str) -> String {
        let value = self.ws_run.replace_all(value, " ");
        let value = self.sep_run.replace_all(&value, "_");
        let value = self.edge_trim.replace_all(&value, "");
        value.trim().to_string()
    }
}

fn compile_lines<'a>(lines: impl Iterator<Item = &'a str>, skipped: &mut usize) -> Vec<Regex> {
    let mut out = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match RegexBuilder::new(line).case_insensitive(true).build() {
            Ok(re) => out.push(re),
            Err(_) => *skipped += 1,
        }
    }
    out
}

/// 「word word」「word_word」のような直後反復をペアごと取り除く。
/// 元実装は後方参照付き正規表現だったが、regexクレートは後方参照を
/// 持たないため専用の走査で同じ挙動を実現している。
fn strip_repeated_words(input: &str) -> String {
    let runs = split_word_runs(input);
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < runs.len() {
        let (is_word, text) = runs[i];
        if is_word
            && i + 2 < runs.len()
            && matches!(runs[i + 1].1, " " | "-" | "_")
            && runs[i + 2].0
            && runs[i + 2].1.to_lowercase() == text.to_lowercase()
        {
            i += 3;
            continue;
        }
        out.push_str(text);
        i += 1;
    }
    out
}

fn split_word_runs(input: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (idx, ch) in input.char_indices() {
        let is_word = ch.is_alphanumeric();
        match current {
            Some(kind) if kind == is_word => {}
            Some(kind) => {
                runs.push((kind, &input[start..idx]));
                start = idx;
                current = Some(is_word);
            }
            None => current = Some(is_word),
        }
    }
    if let Some(kind) = current {
        runs.push((kind, &input[start..]));
    }
    runs
}
