//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to every
//! target. Output goes to stderr so command output on stdout stays parseable.

use crate::config::LogConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "sgw-refresh.log";

/// Keeps the background log writer alive; drop it last
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Build the level filter for `config`
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(config.level.to_ascii_lowercase())
            .with_context(|| format!("Invalid log level '{}'", config.level)),
    }
}

/// Daily-rolling, non-blocking writer under `dir`, created if missing
///
/// Lines are flushed when the returned guard drops.
pub fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber
pub fn init_logging(config: &LogConfig) -> Result<LogGuard> {
    let filter = env_filter(config)?;

    let worker = match &config.file {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
            None
        }
    };

    Ok(LogGuard { _worker: worker })
}
