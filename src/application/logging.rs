//! # Logging Setup
//!
//! Installs the tracing subscriber: an `EnvFilter`, a non-blocking file layer
//! writing `session.log`, and a stderr layer for the terminal.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::config::Settings;
use crate::domain::paths::SESSION_LOG_FILE;
use crate::strings::logs;

/// Default directive: the configured level, with noisy HTTP internals capped at warn.
pub fn filter_directive(settings: &Settings) -> String {
    format!("{},hyper=warn,reqwest=warn", settings.logging.filter)
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process so buffered file output is flushed.
///
/// The terminal layer only shows warnings unless `verbose` is set; the file
/// layer always records everything the filter lets through.
pub fn init(settings: &Settings, working_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    let log_dir = settings.log_directory(working_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    // Clear previous session log
    let log_path = log_dir.join(SESSION_LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, SESSION_LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(settings)));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let console_level = if verbose { LevelFilter::TRACE } else { LevelFilter::WARN };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("{}", logs::logging_to(&log_dir.display().to_string()));
    Ok(guard)
}
