//! Formation CLI - Command-line interface for Formation Insights
//!
//! Commands:
//! - weekly: Compute the weekly insight for a journal export
//! - monthly: Compute the month-over-month comparison for a journal export
//! - validate: Report which records of a journal export would be dropped

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use formation_insights::store::EntryAudit;
use formation_insights::window::parse_reference_instant;
use formation_insights::{
    audit_entries, InsightConfig, InsightEngine, InsightError, JournalEntry, Locale,
    MonthComparison, WeeklyInsight, ENGINE_VERSION,
};

/// Formation - Narrative insights over a reflective journal
#[derive(Parser)]
#[command(name = "formation")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn journal entries into weekly and monthly insights", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the weekly insight
    Weekly(InsightArgs),

    /// Compute the month-over-month comparison
    Monthly(InsightArgs),

    /// Report invalid and duplicate records in a journal export
    Validate {
        /// Entries file, a JSON array of persisted entries (use - for stdin)
        #[arg(short, long)]
        entries: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InsightArgs {
    /// Entries file, a JSON array of persisted entries (use - for stdin)
    #[arg(short, long)]
    entries: PathBuf,

    /// Locale code (e.g., "en", "es-MX")
    #[arg(long, default_value = "en")]
    locale: String,

    /// Reference instant in RFC 3339 (defaults to the current local time)
    #[arg(long)]
    now: Option<String>,

    /// Threshold overrides as a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    output_format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false).compact())
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FormationCliError> {
    match cli.command {
        Commands::Weekly(args) => cmd_weekly(&args),
        Commands::Monthly(args) => cmd_monthly(&args),
        Commands::Validate { entries, json } => cmd_validate(&entries, json),
    }
}

/// Everything a weekly or monthly run needs after reading its inputs
struct Prepared {
    engine: InsightEngine,
    entries: Vec<JournalEntry>,
    locale: Locale,
    now: DateTime<FixedOffset>,
}

fn prepare(args: &InsightArgs) -> Result<Prepared, FormationCliError> {
    let config = match &args.config {
        Some(path) => InsightConfig::from_json(&fs::read_to_string(path)?)?,
        None => InsightConfig::default(),
    };

    let now = match &args.now {
        Some(value) => parse_reference_instant(value)?,
        None => DateTime::<FixedOffset>::from(Local::now()),
    };

    let audit = audit_entries(&read_input(&args.entries)?)?;
    if !audit.dropped.is_empty() {
        warn!(
            dropped = audit.dropped.len(),
            "Skipping invalid records; run 'formation validate' for details"
        );
    }
    debug!(entries = audit.entries.len(), now = %now, "Loaded journal");

    Ok(Prepared {
        engine: InsightEngine::with_config(config),
        entries: audit.entries,
        locale: Locale::parse(&args.locale),
        now,
    })
}

fn cmd_weekly(args: &InsightArgs) -> Result<(), FormationCliError> {
    let prepared = prepare(args)?;
    let translate = prepared.engine.catalog().translator(prepared.locale);
    let insight = prepared.engine.weekly_insight_at(
        &prepared.entries,
        prepared.now,
        prepared.locale,
        &translate,
    );

    match args.output_format {
        OutputFormat::Text => print_weekly(&insight),
        OutputFormat::Json => println!("{}", serde_json::to_string(&insight)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&insight)?),
    }
    Ok(())
}

fn cmd_monthly(args: &InsightArgs) -> Result<(), FormationCliError> {
    let prepared = prepare(args)?;
    let translate = prepared.engine.catalog().translator(prepared.locale);
    let comparison = prepared.engine.month_comparison_at(
        &prepared.entries,
        prepared.now,
        prepared.locale,
        &translate,
    );

    match args.output_format {
        OutputFormat::Text => print_monthly(&comparison),
        OutputFormat::Json => println!("{}", serde_json::to_string(&comparison)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&comparison)?),
    }
    Ok(())
}

fn cmd_validate(entries: &Path, json: bool) -> Result<(), FormationCliError> {
    let audit = audit_entries(&read_input(entries)?)?;
    let report = ValidationReport::from(&audit);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid entries:   {}", report.valid_entries);
        println!("Dropped records: {}", report.dropped_records);

        if !report.errors.is_empty() {
            println!("\nDropped:");
            for err in &report.errors {
                println!(
                    "  - Record {} (index {}): {}",
                    err.entry_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.reason
                );
            }
        }
    }

    if report.dropped_records > 0 {
        Err(FormationCliError::ValidationFailed(report.dropped_records))
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, FormationCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn print_weekly(insight: &WeeklyInsight) {
    println!("{}", insight.notice_text);
    println!("{}", insight.summary_text);
    if !insight.signal_labels.is_empty() {
        println!();
        for label in &insight.signal_labels {
            println!("  - {label}");
        }
    }
    println!();
    println!("{}", insight.metrics_text);
}

fn print_monthly(comparison: &MonthComparison) {
    println!("{}", comparison.title_text);
    println!("{}", comparison.body_text);
    println!();
    println!("{}", comparison.supporting_text);
}

// Error types

#[derive(Debug)]
enum FormationCliError {
    Io(io::Error),
    Insight(InsightError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for FormationCliError {
    fn from(e: io::Error) -> Self {
        FormationCliError::Io(e)
    }
}

impl From<InsightError> for FormationCliError {
    fn from(e: InsightError) -> Self {
        FormationCliError::Insight(e)
    }
}

impl From<serde_json::Error> for FormationCliError {
    fn from(e: serde_json::Error) -> Self {
        FormationCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FormationCliError> for CliError {
    fn from(e: FormationCliError) -> Self {
        match e {
            FormationCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FormationCliError::Insight(e) => {
                let (code, hint) = match &e {
                    InsightError::InvalidTimestamp(_) => {
                        ("INVALID_TIMESTAMP", "Pass --now as RFC 3339, e.g. 2024-03-14T09:00:00-05:00")
                    }
                    InsightError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Check threshold values in the config file")
                    }
                    _ => ("PARSE_ERROR", "Ensure the entries file is a JSON array of journal entries"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FormationCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FormationCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records would be dropped", count),
                hint: Some("Fix or remove the listed records and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_entries: usize,
    dropped_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    entry_id: Option<String>,
    reason: String,
}

impl From<&EntryAudit> for ValidationReport {
    fn from(audit: &EntryAudit) -> Self {
        ValidationReport {
            total_records: audit.entries.len() + audit.dropped.len(),
            valid_entries: audit.entries.len(),
            dropped_records: audit.dropped.len(),
            errors: audit
                .dropped
                .iter()
                .map(|d| ValidationErrorDetail {
                    index: d.index,
                    entry_id: d.id.clone(),
                    reason: d.reason.to_string(),
                })
                .collect(),
        }
    }
}
