// Line-list CLI - headless outbreak analysis of line-list JSON documents

mod exit_codes;
mod report;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use linelist_config::Settings;
use linelist_engine::document::LineListDocument;
use linelist_engine::filter::{ColumnFilter, FilterKey};
use linelist_engine::stats::{sort_by_p_value, AnalysisResult, StudyDesign};
use linelist_engine::timestamp::parse_timestamp;
use linelist_engine::{EngineError, Session, SessionConfig};
use serde::Serialize;

use exit_codes::{EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};
use report::{render, render_incubation, OutputFormat, TsvRecord};

#[derive(Parser)]
#[command(name = "llst")]
#[command(about = "Outbreak line-list analysis (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true, env = "LINELIST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-item statistics for a study design
    #[command(after_help = "\
Examples:
  llst analyze outbreak.json --design case-control
  llst analyze outbreak.json --design cohort --yates --sort-p
  llst analyze outbreak.json --design case-series --format json")]
    Analyze {
        /// Line-list JSON document
        file: PathBuf,

        #[arg(long, short = 'd', value_enum)]
        design: Design,

        /// Yates continuity correction for chi-square
        #[arg(long)]
        yates: bool,

        /// Disable the +0.5 zero-cell correction
        #[arg(long)]
        no_haldane: bool,

        /// Order rows by ascending p-value
        #[arg(long)]
        sort_p: bool,

        #[arg(long, short = 'f', value_enum, default_value = "tsv")]
        format: OutputFormat,
    },

    /// Distinct values of a column with counts, honouring the other filters
    #[command(after_help = "\
Examples:
  llst values outbreak.json --column dietInfo-0
  llst values outbreak.json --column isPatient --filter dietInfo-0=1
  llst values outbreak.json --column symptomOnset --date --filter isPatient=1")]
    Values {
        file: PathBuf,

        /// Filter key: `isPatient`, `symptomOnset`, `dietInfo-0`, ...
        #[arg(long, short = 'c')]
        column: String,

        /// Keep rows whose value is one of the list: `key=v1,v2` (repeatable)
        #[arg(long)]
        filter: Vec<String>,

        /// Keep rows whose timestamp falls on one of the dates: `key=YYYY-MM-DD,...`
        #[arg(long)]
        date_filter: Vec<String>,

        /// Group timestamps by calendar date
        #[arg(long)]
        date: bool,

        #[arg(long, short = 'f', value_enum, default_value = "tsv")]
        format: OutputFormat,
    },

    /// Incubation period summary for cases
    #[command(after_help = "\
Examples:
  llst incubation outbreak.json --exposure '2024-05-01 12:00'
  llst incubation outbreak.json --individual")]
    Incubation {
        file: PathBuf,

        /// Shared exposure time
        #[arg(long, short = 'e')]
        exposure: Option<String>,

        /// Use each row's individualExposureTime
        #[arg(long)]
        individual: bool,

        #[arg(long, short = 'f', value_enum, default_value = "tsv")]
        format: OutputFormat,
    },

    /// Delete empty rows and empty columns
    Clean {
        file: PathBuf,

        /// Output file (defaults to rewriting the input)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Design {
    CaseControl,
    Cohort,
    CaseSeries,
}

impl From<Design> for StudyDesign {
    fn from(design: Design) -> Self {
        match design {
            Design::CaseControl => StudyDesign::CaseControl,
            Design::Cohort => StudyDesign::Cohort,
            Design::CaseSeries => StudyDesign::CaseSeries,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  linelist-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        Commands::Analyze { file, design, yates, no_haldane, sort_p, format } => {
            cmd_analyze(&settings, &file, design.into(), yates, no_haldane, sort_p, format)
        }
        Commands::Values { file, column, filter, date_filter, date, format } => {
            cmd_values(&settings, &file, &column, &filter, &date_filter, date, format)
        }
        Commands::Incubation { file, exposure, individual, format } => {
            cmd_incubation(&settings, &file, exposure.as_deref(), individual, format)
        }
        Commands::Clean { file, output } => cmd_clean(&settings, &file, output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn with_hint_if_io(self, path: &Path) -> Self {
        if self.code == EXIT_IO {
            self.with_hint(format!("check that {} exists and is readable", path.display()))
        } else {
            self
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Io(_) => CliError::io(err.to_string()),
            EngineError::DocumentParse(_) => CliError::parse(err.to_string())
                .with_hint("expected { \"headers\": {...}, \"rows\": [...] }"),
            EngineError::InvalidFilterKey(_) => CliError::args(err.to_string())
                .with_hint("use a scalar key like isPatient or an indexed one like dietInfo-0"),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn open_session(config: SessionConfig, path: &Path) -> Result<Session, CliError> {
    let doc = LineListDocument::load(path)
        .map_err(|e| CliError::from(e).with_hint_if_io(path))?;
    Ok(Session::from_document(doc, config))
}

fn emit(text: &str) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(text.as_bytes()).map_err(|e| CliError::io(e.to_string()))
}

/// Split `key=v1,v2` into a filter key and its value list. `key=` selects blanks.
fn parse_filter_arg(arg: &str) -> Result<(FilterKey, Vec<String>), CliError> {
    let (key, values) = arg
        .split_once('=')
        .ok_or_else(|| CliError::args(format!("invalid filter '{}'", arg)).with_hint("expected key=v1,v2"))?;
    let key: FilterKey = key.trim().parse()?;
    let values = values.split(',').map(|v| v.trim().to_string()).collect();
    Ok((key, values))
}

fn require_column(session: &Session, key: &FilterKey) -> Result<(), CliError> {
    if key.column(session.table().columns()).is_some() {
        return Ok(());
    }
    Err(CliError::args(format!("column '{}' is not in the table", key))
        .with_hint("isConfirmedCase and individualExposureTime appear only when enabled in settings"))
}

// ============================================================================
// analyze
// ============================================================================

fn cmd_analyze(
    settings: &Settings,
    file: &Path,
    design: StudyDesign,
    yates: bool,
    no_haldane: bool,
    sort_p: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut config = settings.session_config();
    if yates {
        config.statistics.yates_correction = true;
    }
    if no_haldane {
        config.statistics.haldane_correction = false;
    }
    let session = open_session(config, file)?;
    log::debug!("analyzing {} rows as {:?}", session.table().row_count(), design);

    let text = match design {
        StudyDesign::CaseControl => render_results(&session.case_control(), sort_p, format)?,
        StudyDesign::Cohort => render_results(&session.cohort(), sort_p, format)?,
        StudyDesign::CaseSeries => render_results(&session.case_series(), sort_p, format)?,
    };
    emit(&text)
}

fn render_results<R>(results: &[R], sort_p: bool, format: OutputFormat) -> Result<String, CliError>
where
    R: AnalysisResult + TsvRecord + Serialize,
{
    let view: Vec<&R> = if sort_p { sort_by_p_value(results) } else { results.iter().collect() };
    render(&view, format)
}

// ============================================================================
// values
// ============================================================================

fn cmd_values(
    settings: &Settings,
    file: &Path,
    column: &str,
    filters: &[String],
    date_filters: &[String],
    by_date: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut session = open_session(settings.session_config(), file)?;
    let target: FilterKey = column.trim().parse()?;
    require_column(&session, &target)?;

    for arg in filters {
        let (key, values) = parse_filter_arg(arg)?;
        require_column(&session, &key)?;
        session.set_filter(key, ColumnFilter::values(values));
    }
    for arg in date_filters {
        let (key, dates) = parse_filter_arg(arg)?;
        require_column(&session, &key)?;
        session.set_filter(key, ColumnFilter::dates(dates));
    }
    log::debug!("{} of {} rows pass the filters", session.visible_rows().len(), session.table().row_count());

    let values = if by_date { session.available_dates(&target) } else { session.available_values(&target) };
    let view: Vec<_> = values.iter().collect();
    emit(&render(&view, format)?)
}

// ============================================================================
// incubation
// ============================================================================

fn cmd_incubation(
    settings: &Settings,
    file: &Path,
    exposure: Option<&str>,
    individual: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut config = settings.session_config();
    if individual {
        config.layout.individual_exposure_mode = true;
    }

    let exposure = match exposure {
        Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
            CliError::args(format!("invalid exposure time '{}'", raw)).with_hint("use YYYY-MM-DD HH:MM")
        })?),
        None => None,
    };

    let session = open_session(config, file)?;
    let summary = session.incubation(exposure).ok_or_else(|| {
        CliError::args("an exposure time is required")
            .with_hint("pass --exposure, or --individual to use per-row exposure times")
    })?;
    emit(&render_incubation(&summary, format)?)
}

// ============================================================================
// clean
// ============================================================================

fn cmd_clean(settings: &Settings, file: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let mut session = open_session(settings.session_config(), file)?;
    let rows = session.delete_empty_rows();
    let columns = session.delete_empty_columns();

    let target = output.unwrap_or(file);
    session.to_document().save(target).map_err(|e| CliError::io(e.to_string()))?;
    eprintln!("removed {} empty rows, {} empty columns -> {}", rows, columns, target.display());
    Ok(())
}
