// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::Value;

use crate::app_config::Config;
use crate::recovery::{RevisionStrategy, RollbackPolicy};
use audit::AuditSink;
use engine::MemoryEngine;
use file_utils::{FileKind, FileManager};
use pipeline::Orchestrator;
use planner::ScriptedPlanner;
use report::ValidationResult;
use schema::{DocumentKind, SchemaValidator};

mod app_config;
mod assertions;
mod audit;
mod enforcer;
mod engine;
mod errors;
mod file_utils;
mod pipeline;
mod plan;
mod planner;
mod recovery;
mod report;
mod schema;
mod snapshot;

/// CLI Wrapper for RevisionStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliRevisionStrategy {
    Bypass,
    AcceptAll,
    RejectAll,
}

impl From<CliRevisionStrategy> for RevisionStrategy {
    fn from(cli_strategy: CliRevisionStrategy) -> Self {
        match cli_strategy {
            CliRevisionStrategy::Bypass => RevisionStrategy::Bypass,
            CliRevisionStrategy::AcceptAll => RevisionStrategy::AcceptAll,
            CliRevisionStrategy::RejectAll => RevisionStrategy::RejectAll,
        }
    }
}

/// CLI Wrapper for DocumentKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDocumentKind {
    Structure,
    Plan,
    Inventory,
}

impl From<CliDocumentKind> for DocumentKind {
    fn from(cli_kind: CliDocumentKind) -> Self {
        match cli_kind {
            CliDocumentKind::Structure => DocumentKind::Structure,
            CliDocumentKind::Plan => DocumentKind::Plan,
            CliDocumentKind::Inventory => DocumentKind::Inventory,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply an edit plan to a document under full validation (default command)
    #[command(alias = "run")]
    Run(RunArgs),

    /// Validate structure, plan, or inventory files without touching a document
    Check(CheckArgs),

    /// Generate shell completions for docwarden
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Document bundle to process
    #[arg(value_name = "DOC_PATH")]
    doc_path: PathBuf,

    /// Edit plan to apply (JSON, or '-' is not supported; use a file)
    #[arg(value_name = "PLAN_PATH")]
    plan_path: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "docwarden.json")]
    config_path: String,

    /// Directory for audit artifacts (overrides config)
    #[arg(short, long)]
    audit_root: Option<PathBuf>,

    /// How tracked revisions are resolved before editing
    #[arg(short, long, value_enum)]
    revision_strategy: Option<CliRevisionStrategy>,

    /// Keep the edited document when post-checks fail instead of rolling back
    #[arg(short, long)]
    keep_on_failure: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// File or directory of .json files to validate
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Force a document kind instead of sniffing schema_version
    #[arg(short, long, value_enum)]
    kind: Option<CliDocumentKind>,
}

/// docwarden - guarded execution of generated document edit plans
///
/// Validates machine-generated edit plans against embedded schemas and a
/// strict operation whitelist, applies them atomically, and verifies the
/// edited document afterwards. Any failure rolls the document back to the
/// pristine copy staged before execution.
#[derive(Parser, Debug)]
#[command(name = "docwarden")]
#[command(author = "docwarden team")]
#[command(version = "1.0.0")]
#[command(about = "Validated, reversible execution of document edit plans")]
#[command(long_about = "docwarden applies generated edit plans to document bundles behind schema
validation, whitelist enforcement and post-edit verification.

EXAMPLES:
    docwarden thesis.json plan.json              # Apply a plan using default config
    docwarden -k thesis.json plan.json           # Keep edits even if post-checks fail
    docwarden -r bypass thesis.json plan.json    # Leave tracked revisions untouched
    docwarden -a /tmp/audit thesis.json plan.json # Write audit artifacts elsewhere
    docwarden check plan.json                    # Validate a single plan offline
    docwarden check --kind structure snap.json   # Force the document kind
    docwarden check ./plans/                     # Validate every .json in a directory
    docwarden completions bash > docwarden.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in docwarden.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.

STATUSES:
    SUCCESS            - plan applied, document verified
    INVALID_PLAN       - plan rejected before execution, document untouched
    SECURITY_VIOLATION - plan tried something outside the whitelist, rolled back
    ROLLBACK           - execution or verification failed, document restored
    EXECUTION_ERROR    - execution failed and the document could not be restored
    FAILED_VALIDATION  - verification failed and the document could not be restored")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Document bundle to process
    #[arg(value_name = "DOC_PATH")]
    doc_path: Option<PathBuf>,

    /// Edit plan to apply (JSON)
    #[arg(value_name = "PLAN_PATH")]
    plan_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "docwarden.json")]
    config_path: String,

    /// Directory for audit artifacts (overrides config)
    #[arg(short, long)]
    audit_root: Option<PathBuf>,

    /// How tracked revisions are resolved before editing
    #[arg(short, long, value_enum)]
    revision_strategy: Option<CliRevisionStrategy>,

    /// Keep the edited document when post-checks fail instead of rolling back
    #[arg(short, long)]
    keep_on_failure: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");

            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;31m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Warn => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;33m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Info => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;32m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Debug => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;36m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Trace => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;35m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "docwarden", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Check(args)) => run_check(args).await,
        Some(Commands::Run(args)) => {
            // Use the explicit run subcommand args
            run_pipeline(args).await
        }
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let doc_path = cli.doc_path.ok_or_else(|| {
                anyhow!("DOC_PATH is required when no subcommand is specified")
            })?;
            let plan_path = cli.plan_path.ok_or_else(|| {
                anyhow!("PLAN_PATH is required when no subcommand is specified")
            })?;

            let run_args = RunArgs {
                doc_path,
                plan_path,
                config_path: cli.config_path,
                audit_root: cli.audit_root,
                revision_strategy: cli.revision_strategy,
                keep_on_failure: cli.keep_on_failure,
                log_level: cli.log_level,
            };
            run_pipeline(run_args).await
        }
    }
}

async fn run_pipeline(options: RunArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        // Override config with CLI options if provided
        if let Some(audit_root) = &options.audit_root {
            config.audit_root = audit_root.clone();
        }

        if let Some(strategy) = &options.revision_strategy {
            config.revision_strategy = strategy.clone().into();
        }

        if options.keep_on_failure {
            config.rollback_policy = RollbackPolicy::KeepAndWarn;
        }

        // Update log level in config if specified via command line
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        config
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let mut config = Config::default();

        if let Some(audit_root) = &options.audit_root {
            config.audit_root = audit_root.clone();
        }

        if let Some(strategy) = &options.revision_strategy {
            config.revision_strategy = strategy.clone().into();
        }

        if options.keep_on_failure {
            config.rollback_policy = RollbackPolicy::KeepAndWarn;
        }

        // Apply command line log level to default config if specified
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        // Just update the max level without reinitializing the logger
        log::set_max_level(config.log_level.to_level_filter());
    }

    if !options.doc_path.is_file() {
        return Err(anyhow!("Document does not exist: {:?}", options.doc_path));
    }
    if !options.plan_path.is_file() {
        return Err(anyhow!("Plan does not exist: {:?}", options.plan_path));
    }

    // Every run gets its own audit directory under the configured root
    let sink = Arc::new(AuditSink::create(&config.audit_root)?);
    info!("Audit artifacts for run {} under {:?}", sink.run_id(), sink.dir());

    let engine = MemoryEngine::new();
    let planner = ScriptedPlanner::from_file(&options.plan_path)
        .context("Failed to load edit plan")?;

    let orchestrator = Orchestrator::new(engine, planner, Arc::clone(&sink), config.pipeline_options())
        .context("Failed to assemble processing pipeline")?;

    let report = orchestrator.run(&options.doc_path).await;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    if report.succeeded() {
        info!("Success: {} ({} ms)", report.message, report.duration_ms);
        Ok(())
    } else {
        Err(anyhow!("Processing ended with status {}: {}", report.status, report.message))
    }
}

async fn run_check(options: CheckArgs) -> Result<()> {
    let validator = SchemaValidator::new()
        .context("Failed to build schema validator")?;

    // Collect the target files
    let files = if options.path.is_file() {
        vec![options.path.clone()]
    } else if options.path.is_dir() {
        let found = FileManager::find_files(&options.path, "json")?;
        if found.is_empty() {
            warn!("No .json files found under {:?}", options.path);
            return Ok(());
        }
        found
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.path));
    };

    let total = files.len();
    let mut failures = 0;

    for file in &files {
        match check_file(&validator, file, options.kind.clone()) {
            Ok(result) => {
                if result.is_valid() {
                    info!("{}: valid ({})", file.display(), result.summary());
                    for message in result.warning_messages() {
                        warn!("{}: {}", file.display(), message);
                    }
                } else {
                    failures += 1;
                    for message in result.error_messages() {
                        error!("{}: {}", file.display(), message);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                error!("{}: {}", file.display(), e);
            }
        }
    }

    if failures == 0 {
        info!("All {} file(s) passed validation", total);
        Ok(())
    } else {
        Err(anyhow!("{} of {} file(s) failed validation", failures, total))
    }
}

// Validate one file, sniffing the document kind unless it was forced
fn check_file(validator: &SchemaValidator, path: &Path, forced: Option<CliDocumentKind>) -> Result<ValidationResult> {
    let content = FileManager::read_to_string(path)?;

    if let Some(kind) = forced {
        return Ok(validate_content(validator, &content, kind.into()));
    }

    match FileManager::detect_file_kind(path)? {
        FileKind::Structure => Ok(validate_content(validator, &content, DocumentKind::Structure)),
        FileKind::Plan => Ok(validate_content(validator, &content, DocumentKind::Plan)),
        FileKind::Inventory => Ok(validate_content(validator, &content, DocumentKind::Inventory)),
        FileKind::Bundle => {
            // Bundles wrap a structure snapshot and optionally an inventory
            let value: Value = serde_json::from_str(&content)
                .with_context(|| format!("File is not valid JSON: {:?}", path))?;

            let mut result = ValidationResult::passed();
            match value.get("structure") {
                Some(structure) => result.merge(validator.validate(structure, DocumentKind::Structure)),
                None => result.push_error("bundle", "bundle has no structure object"),
            }
            if let Some(inventory) = value.get("inventory") {
                result.merge(validator.validate(inventory, DocumentKind::Inventory));
            }
            Ok(result)
        }
        FileKind::Unknown => {
            Err(anyhow!("unknown document kind (no schema_version; use --kind to force one)"))
        }
    }
}

// Schema validation, plus the enforcer's sink-free gates for plans
fn validate_content(validator: &SchemaValidator, content: &str, kind: DocumentKind) -> ValidationResult {
    let mut result = validator.validate_str(content, kind);
    if kind == DocumentKind::Plan {
        if let Ok(value) = serde_json::from_str::<Value>(content) {
            result.merge(enforcer::check_plan(&value));
        }
    }
    result
}
