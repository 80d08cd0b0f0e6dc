use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use frenamer_core::{
    app_paths, apply_plan_in_background, generate_plan, load_config, CancelToken, CleanupConfig,
    CleanupMode, ConflictKind, PlanOptions, RenamePlan, RenamePolicy, SortStrategy, WorkerMessage,
};
use std::fs;

#[derive(Debug, Parser)]
#[command(name = "frenamer-cli")]
#[command(about = "テンプレートと清掃ルールでファイル名を一括リネームします")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct RenameArgs {
    /// 対象フォルダ(直下のみ、再帰しない)
    #[arg(long)]
    dir: String,
    /// カンマ区切りの拡張子フィルタ。空なら全ファイル
    #[arg(long, default_value = "")]
    ext: String,
    /// 並び替え: mtime-desc/mtime-asc/ctime-desc/ctime-asc/name-asc/name-desc/
    /// name-numeric/name-natural/size-desc/size-asc/type-asc/type-desc/
    /// extension-asc/extension-desc/random
    #[arg(long, default_value = "name-asc")]
    sort: String,
    /// 新名称テンプレート。省略時は設定ファイルの既定値
    #[arg(long)]
    template: Option<String>,
    #[arg(long, default_value_t = 1)]
    start_index: u32,
    #[arg(long, default_value_t = 3)]
    digits: usize,
    /// 清掃モード: smart / literal / regex。省略時は清掃なし
    #[arg(long)]
    cleanup: Option<String>,
    /// 清掃ルールファイル(1行1ルール)。literal/regexモード用
    #[arg(long)]
    rules_file: Option<String>,
    #[arg(long, default_value_t = false)]
    backup: bool,
    #[arg(long, default_value_t = false)]
    overwrite: bool,
    #[arg(long, default_value_t = false)]
    no_keep_extension: bool,
    #[arg(long, default_value_t = false)]
    case_sensitive: bool,
    /// 指定しない限りdry-run
    #[arg(long, default_value_t = false)]
    apply: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let sort: SortStrategy = args.sort.parse().map_err(anyhow::Error::msg)?;

    let cleanup = match args.cleanup.as_deref() {
        None => CleanupConfig {
            enabled: false,
            ..config.cleanup_config()
        },
        Some(mode) => {
            let mode: CleanupMode = mode.parse().map_err(anyhow::Error::msg)?;
            let rules_text = match args.rules_file.as_deref() {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("清掃ルールを読めませんでした: {path}"))?,
                None => config.cleanup_rules.join("\n"),
            };
            CleanupConfig {
                enabled: true,
                mode,
                rules_text,
                smart_patterns: config.smart_patterns.clone(),
            }
        }
    };

    let policy = RenamePolicy {
        backup_original: args.backup,
        overwrite_existing: args.overwrite,
        keep_extension: !args.no_keep_extension,
        case_sensitive: args.case_sensitive,
    };

    let options = PlanOptions {
        directory: args.dir.into(),
        extension_filter: args.ext,
        sort,
        template: args.template.unwrap_or(config.template),
        start_index: args.start_index,
        index_digits: args.digits,
        cleanup,
        policy,
    };

    let plan = generate_plan(&options)?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Table => {
            print_table(&plan);
        }
    }

    if args.apply {
        let rx = apply_plan_in_background(plan, policy, CancelToken::new());
        for message in rx {
            match message {
                WorkerMessage::Progress(event) => {
                    eprintln!("[{:3}%] {}", event.percent, event.message);
                }
                WorkerMessage::Done(result) => {
                    for failure in &result.failures {
                        eprintln!("失敗: {}: {}", failure.path.display(), failure.reason);
                    }
                    eprintln!(
                        "リネーム完了: {}/{}件成功",
                        result.succeeded, result.attempted
                    );
                }
            }
        }
    } else {
        eprintln!("dry-runモード: 実ファイルは変更していません。適用するには --apply を指定してください。");
    }

    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_table(plan: &RenamePlan) {
    println!("元ファイル -> 新ファイル (状態)");
    for entry in &plan.entries {
        let status = match entry.conflict {
            None => "OK",
            Some(ConflictKind::Duplicate) => "重複名称",
            Some(ConflictKind::ExistsOnDisk) => "既存ファイルと衝突",
        };
        println!("{} -> {} ({})", entry.record.file_name, entry.new_name, status);
    }

    println!(
        "\n集計: scanned={} non_regular_skip={} filtered_out={} planned={} conflicts={}",
        plan.stats.scan.scanned_entries,
        plan.stats.scan.skipped_non_regular,
        plan.stats.scan.filtered_out,
        plan.stats.planned,
        plan.stats.conflicts
    );
    if plan.stats.skipped_cleanup_rules > 0 {
        eprintln!(
            "警告: コンパイルできない清掃ルールを{}行読み飛ばしました",
            plan.stats.skipped_cleanup_rules
        );
    }
}
