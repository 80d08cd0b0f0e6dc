mod apply;
mod cleanup;
mod config;
mod conflict;
mod discover;
mod planner;
mod record;
mod sort;
mod template;

/// テンプレート未指定時の既定形
pub const DEFAULT_TEMPLATE: &str = "{name}_{index}";

pub use apply::{
    apply_plan, apply_plan_in_background, apply_plan_with_cancel, CancelToken, ExecutionResult,
    ProgressEvent, RenameFailure, RenamePolicy, WorkerMessage,
};
pub use cleanup::{CleanupConfig, CleanupMode, CleanupPipeline, DEFAULT_SMART_PATTERNS};
pub use config::{app_paths, load_config, save_config, AppConfig, AppPaths};
pub use conflict::{detect_conflicts, ConflictKind};
pub use discover::{filter_by_extension, parse_extension_filter, scan_directory, ScanStats};
pub use planner::{generate_plan, PlanOptions, PlanStats, RenameEntry, RenamePlan};
pub use record::FileRecord;
pub use sort::{sort_records, SortStrategy};
pub use template::{
    parse_template, render_template, synthesize, validate_template, SynthesisOptions,
    TemplateError, TemplatePart, Token,
};
