//! Diagnostic logging setup.
//!
//! Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`, or
//! `debug` when verbose). Output goes to stderr, human-readable or JSON, and
//! optionally to a daily-rolling file.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name prefix of the rolling log.
pub const LOG_FILE_NAME: &str = "installkit.log";

/// Build the filter from `RUST_LOG`, falling back to the verbosity default.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialise the global subscriber.
///
/// When `log_dir` is given, a daily-rolling `installkit.log` is written there
/// as well. Keep the returned guard alive until exit so buffered lines flush.
pub fn init(verbose: bool, json: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stderr_layer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_defaults() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter(false).to_string(), "info");
            assert_eq!(env_filter(true).to_string(), "debug");
        }
    }
}
