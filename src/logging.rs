use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix of rolled log files (`formatgate.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "formatgate";

/// Build the level filter. `RUST_LOG` wins over `level` when set.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level or filter: {}", level)),
    }
}

/// Setup logging with console output and an optional rotating file appender.
///
/// Console output goes to stderr so stdout stays free for diffs and summaries.
/// When `log_dir` is given, logs are also written there with daily rotation.
///
/// # Arguments
/// * `level` - Level or filter directive (e.g. "info", "formatgate=debug")
/// * `log_dir` - Directory for log files, or `None` for console only
///
/// # Returns
/// The file appender's guard, which must be held for the duration of the
/// program to keep file logging active. A second call in the same process
/// leaves the first subscriber in place.
pub fn setup_logging(level: &str, log_dir: Option<&Utf8Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = build_filter(level)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(log_dir) => {
            if !log_dir.exists() {
                fs::create_dir_all(log_dir)
                    .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
            }

            let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log files
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if initialized.is_err() {
        tracing::debug!("Logging already initialized, keeping existing subscriber");
        return Ok(guard);
    }

    tracing::debug!(
        "Logging initialized: level={}, log_dir={:?}",
        level,
        log_dir
    );

    Ok(guard)
}
