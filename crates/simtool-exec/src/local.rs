//! Local command execution using `tokio::process`

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::command::CommandLine;
use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandExecutor;

/// Local command executor
///
/// Executes commands on the local machine using `tokio::process::Command`.
/// No timeout is applied; the package manager's own behaviour governs how
/// long a step takes.
#[derive(Debug, Clone)]
pub struct LocalExecutor;

impl LocalExecutor {
    /// Create a new local executor
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    #[instrument(skip(self, cmd), fields(command = %cmd), level = "debug")]
    async fn run(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        debug!("executing local command");

        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ExecError::ProgramNotFound(cmd.program.clone()),
                _ => ExecError::SpawnError(e.to_string()),
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        // non-zero exits are routine for queries (`rpm -q` on a missing package)
        debug!(status, duration = ?duration, stderr = %stderr.trim(), "command completed");

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("echo").arg("hello"))
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_failure() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("sh").args(["-c", "exit 42"]))
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(result.status, 42);
    }

    #[tokio::test]
    async fn test_run_with_stderr() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("sh").args(["-c", "echo error >&2"]))
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stderr.trim(), "error");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("simtool-definitely-not-a-program"))
            .await;

        assert!(matches!(result, Err(ExecError::ProgramNotFound(_))));
    }

    #[test]
    fn test_locate() {
        let executor = LocalExecutor::new();
        assert!(executor.locate("sh").is_some());
        assert!(executor.locate("simtool-definitely-not-a-program").is_none());
    }
}
