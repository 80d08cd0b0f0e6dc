use crate::apply::RenamePolicy;
use crate::cleanup::{CleanupConfig, CleanupMode, DEFAULT_SMART_PATTERNS};
use crate::sort::SortStrategy;
use crate::DEFAULT_TEMPLATE;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub template: String,
    pub extension_filter: String,
    pub sort: SortStrategy,
    pub start_index: u32,
    pub index_digits: usize,
    pub cleanup_enabled: bool,
    pub cleanup_mode: CleanupMode,
    /// 1行1ルール
    pub cleanup_rules: Vec<String>,
    /// スマート清掃のパターン。既定リストを丸ごと差し替えられる。
    pub smart_patterns: Vec<String>,
    pub backup_original: bool,
    pub overwrite_existing: bool,
    pub keep_extension: bool,
    pub case_sensitive: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            extension_filter: String::new(),
            sort: SortStrategy::NameAsc,
            start_index: 1,
            index_digits: 3,
            cleanup_enabled: false,
            cleanup_mode: CleanupMode::Smart,
            cleanup_rules: Vec::new(),
            smart_patterns: DEFAULT_SMART_PATTERNS.iter().map(|v| v.to_string()).collect(),
            backup_original: false,
            overwrite_existing: false,
            keep_extension: true,
            case_sensitive: false,
        }
    }
}

impl AppConfig {
    pub fn cleanup_config(&self) -> CleanupConfig {
        CleanupConfig {
            enabled: self.cleanup_enabled,
            mode: self.cleanup_mode,
            rules_text: self.cleanup_rules.join("\n"),
            smart_patterns: self.smart_patterns.clone(),
        }
    }

    pub fn policy(&self) -> RenamePolicy {
        RenamePolicy {
            backup_original: self.backup_original,
            overwrite_existing: self.overwrite_existing,
            keep_extension: self.keep_extension,
            case_sensitive: self.case_sensitive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "moderntools", "frenamer")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    if !paths.config_path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(&paths.config_path).with_context(|| {
        format!(
            "設定ファイルを読めませんでした: {}",
            paths.config_path.display()
        )
    })?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "設定ディレクトリを作成できませんでした: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "設定ファイルを書き込めませんでした: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}
