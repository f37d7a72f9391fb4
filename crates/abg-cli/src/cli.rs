//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "abg",
    version,
    about = "Antibiogram ingestion and shared-profile matching",
    long_about = "Ingest laboratory antibiogram spreadsheets into per-specimen records \
                  and find specimens sharing an identical antibiotic profile.\n\n\
                  Reads legacy and modern workbooks as well as CSV/TSV exports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the store snapshot and the default config file.
    #[arg(long = "data-dir", value_name = "DIR", default_value = "abg-data", global = true)]
    pub data_dir: PathBuf,

    /// Service config file (default: <DATA_DIR>/config.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient names in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest one or more spreadsheet files.
    Ingest(IngestArgs),

    /// List stored specimens, newest collection date first.
    List(ListArgs),

    /// Show stored specimens in detail.
    Show(IdArgs),

    /// Show the specimens sharing a specimen's antibiotic profile.
    Matches(MatchArgs),

    /// Delete specimens and their profile memberships.
    Delete(IdArgs),
}

#[derive(Parser)]
pub struct IngestArgs {
    /// Spreadsheet files (.xls, .xlsx, .ods, .csv, .tsv, .txt).
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Earliest collection date, inclusive (YYYY-MM-DD).
    #[arg(long = "from", value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Latest collection date, inclusive (YYYY-MM-DD).
    #[arg(long = "to", value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Case-insensitive part of the patient name.
    #[arg(long = "patient", value_name = "TEXT")]
    pub patient: Option<String>,

    /// Page size (default: the configured page size).
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    #[arg(long = "offset", default_value_t = 0)]
    pub offset: usize,
}

#[derive(Parser)]
pub struct IdArgs {
    /// Specimen identifiers.
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}

#[derive(Parser)]
pub struct MatchArgs {
    /// Specimen identifier.
    #[arg(value_name = "ID")]
    pub id: String,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
