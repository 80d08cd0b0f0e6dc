use crate::record::FileRecord;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Token(Token),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// 清掃後のstem
    Name,
    /// 元のstem
    Original,
    Date,
    DateTime,
    Time,
    Year,
    Month,
    Day,
    Index,
    Size,
    SizeKb,
    SizeMb,
    Ext,
    Parent,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("テンプレートが空です")]
    Empty,
    #[error("中括弧の対応が不正です")]
    UnbalancedBraces,
    #[error("未対応トークンです: {0}")]
    UnknownToken(String),
}

#[derive(Debug, Clone, Copy)]
pub struct SynthesisOptions {
    pub start_index: u32,
    pub index_digits: usize,
    pub keep_extension: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            start_index: 1,
            index_digits: 3,
            keep_extension: true,
        }
    }
}

pub fn validate_template(input: &str) -> Result<(), TemplateError> {
    parse_template(input).map(|_| ())
}

pub fn parse_template(input: &str) -> Result<Vec<TemplatePart>, TemplateError> {
    if input.is_empty() {
        return Err(TemplateError::Empty);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let mut token = String::new();
                let mut found_close = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        found_close = true;
                        break;
                    }
                    if next == '{' {
                        return Err(TemplateError::UnbalancedBraces);
                    }
                    token.push(next);
                }
                if !found_close || token.is_empty() {
                    return Err(TemplateError::UnbalancedBraces);
                }
                parts.push(TemplatePart::Token(parse_token(&token)?));
            }
            '}' => return Err(TemplateError::UnbalancedBraces),
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    if parts.is_empty() {
        return Err(TemplateError::Empty);
    }

    Ok(parts)
}

fn parse_token(token: &str) -> Result<Token, TemplateError> {
    match token {
        "name" => Ok(Token::Name),
        "original" => Ok(Token::Original),
        "date" => Ok(Token::Date),
        "datetime" => Ok(Token::DateTime),
        "time" => Ok(Token::Time),
        "year" => Ok(Token::Year),
        "month" => Ok(Token::Month),
        "day" => Ok(Token::Day),
        "index" => Ok(Token::Index),
        "size" => Ok(Token::Size),
        "size_kb" => Ok(Token::SizeKb),
        "size_mb" => Ok(Token::SizeMb),
        "ext" => Ok(Token::Ext),
        "parent" => Ok(Token::Parent),
        other => Err(TemplateError::UnknownToken(other.to_string())),
    }
}

pub fn render_template(
    parts: &[TemplatePart],
    record: &FileRecord,
    cleaned_stem: &str,
    ordinal: usize,
    opts: &SynthesisOptions,
) -> String {
    let mut output = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(s) => output.push_str(s),
            TemplatePart::Token(token) => {
                let value = match token {
                    Token::Name => cleaned_stem.to_string(),
                    Token::Original => record.stem.clone(),
                    Token::Date => record.modified.format("%Y%m%d").to_string(),
                    Token::DateTime => record.modified.format("%Y%m%d_%H%M%S").to_string(),
                    Token::Time => record.modified.format("%H%M%S").to_string(),
                    Token::Year => record.modified.format("%Y").to_string(),
                    Token::Month => record.modified.format("%m").to_string(),
                    Token::Day => record.modified.format("%d").to_string(),
                    Token::Index => padded_index(ordinal, opts),
                    Token::Size => record.size.to_string(),
                    Token::SizeKb => format!("{:.1}", record.size as f64 / 1024.0),
                    Token::SizeMb => format!("{:.1}", record.size as f64 / (1024.0 * 1024.0)),
                    Token::Ext => record.extension.trim_start_matches('.').to_string(),
                    Token::Parent => record.parent_name.clone(),
                };
                output.push_str(&value);
            }
        }
    }
    output
}

/// テンプレートを展開して新ファイル名を合成する。パース失敗や未知トークンは
/// ここで握り潰し、安全な既定形 {original}_{index} に落とす。この境界から
/// 上にエラーは出さない。
pub fn synthesize(
    record: &FileRecord,
    cleaned_stem: &str,
    ordinal: usize,
    template: &str,
    opts: &SynthesisOptions,
) -> String {
    let base = match parse_template(template) {
        Ok(parts) => render_template(&parts, record, cleaned_stem, ordinal, opts),
        Err(_) => format!("{}_{}", record.stem, padded_index(ordinal, opts)),
    };

    if opts.keep_extension {
        format!("{}{}", base, record.extension)
    } else {
        base
    }
}

fn padded_index(ordinal: usize, opts: &SynthesisOptions) -> String {
    let value = opts.start_index as usize + ordinal;
    format!("{value:0width$}", width = opts.index_digits)
}
