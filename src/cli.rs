//! Command-line interface.
//!
//! `formatgate check` reports what would change and exits non-zero if anything
//! would; `formatgate apply` writes the changes. Both run every configured
//! format (or the ones named with `--format`) in configuration order.

use crate::config::ConfigManager;
use crate::error::ConfigError;
use crate::logging::setup_logging;
use crate::metrics::Metrics;
use crate::models::{FileOutcome, FileReport};
use crate::services::{RunMode, Summary, summarize_run};
use crate::state::{StateChange, StateManager};
use crate::{FormatRequest, VERSION};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

/// Every file formatted, excluded or unchanged as expected.
pub const EXIT_OK: i32 = 0;

/// A file failed, was cancelled, or (check mode) would change.
pub const EXIT_FAILURE: i32 = 1;

/// Configuration was invalid; no file was touched.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Format files, skipping the ones whose content carries an exclusion marker
#[derive(Parser, Debug)]
#[command(
    name = "formatgate",
    about = "Format files, skipping the ones whose content carries an exclusion marker",
    version,
    long_about = "formatgate runs configured formatting steps over the files matched by each \
                  format in formatgate.yaml. Files whose content contains one of the format's \
                  exclusion markers (e.g. a \"generated file\" banner) are left untouched."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Log every file decision")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Report files that would change without writing them",
        long_about = "Runs every step chain without writing. Prints a unified diff for each \
                      file that would change and exits with status 1 if any would.\n\n\
                      Examples:\n  \
                      formatgate check\n  \
                      formatgate check --format toLower --root ./docs"
    )]
    Check(RunArgs),

    #[command(
        about = "Format files in place",
        long_about = "Runs every step chain and atomically rewrites the files whose content \
                      changed.\n\n\
                      Examples:\n  \
                      formatgate apply\n  \
                      formatgate apply --jobs 4"
    )]
    Apply(RunArgs),
}

impl Commands {
    pub fn mode(&self) -> RunMode {
        match self {
            Commands::Check(_) => RunMode::Check,
            Commands::Apply(_) => RunMode::Apply,
        }
    }

    pub fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Check(args) | Commands::Apply(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Project root; targets are resolved relative to it"
    )]
    pub root: Utf8PathBuf,

    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Project file (defaults to <root>/formatgate.yaml)"
    )]
    pub config: Option<Utf8PathBuf>,

    #[arg(
        short = 'f',
        long = "format",
        value_name = "NAME",
        help = "Only run this format (repeatable; defaults to all)"
    )]
    pub formats: Vec<String>,

    #[arg(short = 'j', long, value_name = "N", help = "Number of files processed at once")]
    pub jobs: Option<usize>,

    #[arg(long, value_name = "DIR", help = "Also write logs to this directory")]
    pub log_dir: Option<Utf8PathBuf>,
}

/// Run the parsed command line and return the process exit status.
pub async fn run_cli(args: &CliArgs) -> i32 {
    let mode = args.command.mode();
    let run_args = args.command.run_args();

    let mut manager = ConfigManager::new(&run_args.root);
    if let Some(config) = &run_args.config {
        manager = manager.with_project_config(config);
    }

    let settings = match manager.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return EXIT_CONFIG_ERROR;
        }
    };

    let level = if let Some(level) = &args.log_level {
        level.clone()
    } else if args.verbose {
        "debug".to_string()
    } else if args.quiet {
        "error".to_string()
    } else {
        settings.log_level.clone()
    };
    let log_dir = run_args
        .log_dir
        .clone()
        .or_else(|| settings.log_dir.as_deref().map(Utf8PathBuf::from));
    let _guard = match setup_logging(&level, log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return EXIT_CONFIG_ERROR;
        }
    };

    tracing::debug!("formatgate v{} starting", VERSION);
    tracing::debug!("Arguments: {:?}", args);

    let project = match manager.load_project_config() {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return EXIT_CONFIG_ERROR;
        }
    };

    let names: Vec<String> = if run_args.formats.is_empty() {
        project.formats.keys().cloned().collect()
    } else {
        run_args.formats.clone()
    };
    if names.is_empty() {
        eprintln!(
            "Error: no formats configured in {}",
            manager.project_config_path()
        );
        return EXIT_CONFIG_ERROR;
    }

    // Validate every format before touching any file
    let workers = run_args.jobs.unwrap_or(settings.workers);
    if workers == 0 {
        eprintln!("Error: {}", ConfigError::ZeroWorkers);
        return EXIT_CONFIG_ERROR;
    }
    let requests = match names
        .iter()
        .map(|name| -> Result<(String, FormatRequest), ConfigError> {
            let format = project.format(name)?;
            let request = FormatRequest::from_config(manager.root(), format)?
                .mode(mode)
                .workers(workers)
                .respect_ignore_files(settings.respect_ignore_files);
            Ok((name.clone(), request))
        })
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(requests) => requests,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_CONFIG_ERROR;
        }
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing files in progress");
            let _ = cancel_tx.send(true);
        }
    });

    let state = StateManager::new();
    let progress = spawn_progress_listener(&state);
    let metrics = Arc::new(Metrics::new());

    let mut total = Summary::default();
    for (name, request) in requests {
        let result = match request
            .run(
                Some(name.clone()),
                cancel_rx.clone(),
                Some(state.clone()),
                Some(Arc::clone(&metrics)),
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error: {e}");
                ctrl_c.abort();
                progress.abort();
                return EXIT_CONFIG_ERROR;
            }
        };

        if !args.quiet {
            for report in &result.reports {
                print_report(report, mode);
            }
        }

        let summary = summarize_run(&result);
        tracing::info!("{}: {}", name, summary);
        total.merge(summary);
    }

    ctrl_c.abort();
    progress.abort();

    total.log();
    metrics.log_summary();
    if !args.quiet {
        println!("{}", total);
    }

    exit_code(&total, mode)
}

/// Map a merged summary to the process exit status.
pub fn exit_code(summary: &Summary, mode: RunMode) -> i32 {
    if summary.is_failure(mode) {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

fn print_report(report: &FileReport, mode: RunMode) {
    match (&report.outcome, mode) {
        (FileOutcome::Changed { .. }, RunMode::Check) => {
            println!("would change: {}", report.path);
            if let Some(diff) = &report.diff {
                print!("{}", diff);
            }
        }
        (FileOutcome::Changed { .. }, RunMode::Apply) => println!("formatted: {}", report.path),
        (FileOutcome::Failed(error), _) => eprintln!("failed: {}: {}", report.path, error),
        (FileOutcome::Unchanged | FileOutcome::Excluded, _) => {}
    }
}

fn spawn_progress_listener(state: &StateManager) -> tokio::task::JoinHandle<()> {
    let mut rx = state.subscribe();
    tokio::spawn(async move {
        loop {
            let change = match rx.recv().await {
                Ok(change) => change,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match change {
                StateChange::RunStarted {
                    format_name,
                    total_files,
                } => tracing::info!(
                    "Running {} over {} files",
                    format_name.as_deref().unwrap_or("format"),
                    total_files
                ),
                StateChange::FileProcessed { path, status } => {
                    tracing::debug!("{}: {}", path, status)
                }
                StateChange::RunCancelled => tracing::warn!("Run cancelled"),
                _ => {}
            }
        }
    })
}
