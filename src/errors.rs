//! Typed error hierarchy for the installation engine.
//!
//! Three enums cover the places where failure has structure worth matching on:
//! - `RunError`: spawning and waiting on an external process
//! - `AuditError`: reading and writing the durable audit log, inline or on the blocking pool
//! - `CommandParseError`: tokenising a command string into argv
//!
//! Everything above these (CLI, configuration loading) uses `anyhow`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from running a single external process.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the append-only audit log.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit log I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize audit entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Audit log lock poisoned")]
    LockPoisoned,

    #[error("Audit task panicked: {0}")]
    TaskPanicked(String),
}

impl AuditError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors from splitting a command line into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Unterminated {quote} quote in command")]
    UnterminatedQuote { quote: char },

    #[error("Trailing escape character in command")]
    TrailingEscape,
}
