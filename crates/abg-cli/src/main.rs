//! Antibiogram CLI.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use abg_cli::logging::{LogConfig, LogFormat, init_logging};
use abg_cli::workspace::Workspace;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_delete, run_ingest, run_list, run_matches, run_show};
use crate::summary::{print_ingest_report, print_listing, print_matches, print_records};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let workspace = Workspace::open(&cli.data_dir, cli.config.as_deref())?;
    match &cli.command {
        Command::Ingest(args) => {
            let report = run_ingest(&workspace, args)?;
            print_ingest_report(&report);
            Ok(if report.files_unreadable() + report.sheets_rejected() > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::List(args) => {
            let page = run_list(&workspace, args)?;
            print_listing(&page, args.offset);
            Ok(ExitCode::SUCCESS)
        }
        Command::Show(args) => {
            let records = run_show(&workspace, args)?;
            print_records(&records);
            Ok(if records.len() < args.ids.len() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Matches(args) => {
            print_matches(&run_matches(&workspace, args)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete(args) => {
            let removed = run_delete(&workspace, args)?;
            println!("Deleted {removed} of {} specimens", args.ids.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        log_data: cli.log_data,
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
