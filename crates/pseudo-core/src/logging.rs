//! Tracing subscriber setup.
//!
//! The full-screen UI owns the terminal, so interactive sessions log to a
//! daily-rolling file under `$PSEUDO_HOME/logs`. One-shot commands log to
//! stderr and stay quiet (warn) unless `PSEUDO_LOG` asks for more.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, paths};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "PSEUDO_LOG";

const LOG_FILE_PREFIX: &str = "pseudo.log";

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error, for non-interactive commands.
    Stderr,
    /// Rolling file in the logs directory, for the terminal UI.
    File,
}

/// Keeps the non-blocking file writer alive.
///
/// Dropping it flushes buffered records, so hold it until the program exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Installs the global tracing subscriber.
///
/// # Errors
/// Returns an error if the filter is invalid, the log directory cannot be
/// created, or a subscriber is already installed.
pub fn init(config: &Config, target: LogTarget) -> Result<LogGuard> {
    let fallback = match target {
        LogTarget::Stderr => "warn",
        LogTarget::File => config.log_filter.as_str(),
    };
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), fallback)?;

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::File => {
            let dir = paths::logs_dir();
            let worker = init_file(&dir, filter)?;
            tracing::debug!(dir = %dir.display(), "file logging enabled");
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
    }
}

fn init_file(dir: &Path, filter: EnvFilter) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(guard)
}

/// Builds the filter: env directive first, then the fallback.
fn build_filter(env_value: Option<&str>, fallback: &str) -> Result<EnvFilter> {
    let directive = env_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback);
    EnvFilter::try_new(directive).with_context(|| format!("Invalid log filter: {directive}"))
}
