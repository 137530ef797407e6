//! External process execution with a hard wall-clock timeout.

use crate::errors::RunError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Captured result of a process that ran to exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Abstraction over process execution for testability.
/// Real implementation: `TokioProcessRunner`.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments, never through a shell.
    ///
    /// A process exceeding `limit` must be killed and reported as
    /// [`RunError::TimedOut`].
    async fn run(&self, argv: &[String], limit: Duration) -> Result<CommandOutput, RunError>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, argv: &[String], limit: Duration) -> Result<CommandOutput, RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        // On timeout the `wait_with_output` future is dropped together with the
        // child, and `kill_on_drop` terminates the process.
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| RunError::Wait {
                program: program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(RunError::TimedOut {
                    program: program.clone(),
                    timeout: limit,
                });
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_argv_is_rejected() {
        let result = TokioProcessRunner::new().run(&[], Duration::from_secs(1)).await;
        assert!(matches!(result, Err(RunError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_distinct() {
        let result = TokioProcessRunner::new()
            .run(&argv(&["definitely-not-a-real-program-xyz"]), Duration::from_secs(5))
            .await;
        match result {
            Err(RunError::SpawnFailed { program, .. }) => {
                assert_eq!(program, "definitely-not-a-real-program-xyz");
            }
            other => panic!("Expected SpawnFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let output = TokioProcessRunner::new()
            .run(&argv(&["echo", "1.2.3"]), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "1.2.3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_reported() {
        let output = TokioProcessRunner::new()
            .run(&argv(&["false"]), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let start = std::time::Instant::now();
        let result = TokioProcessRunner::new()
            .run(&argv(&["sleep", "30"]), Duration::from_millis(200))
            .await;
        assert!(matches!(result, Err(RunError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
