//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result of a command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success, -1 if killed by a signal)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Build a result with the given status and output
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
        }
    }

    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Combine stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Last non-empty line of stderr, falling back to stdout
    ///
    /// Package managers print their actual complaint last.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let last_line = |s: &str| {
            s.lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
        };
        last_line(&self.stderr)
            .or_else(|| last_line(&self.stdout))
            .unwrap_or_else(|| format!("exit status {}", self.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_summary_prefers_stderr() {
        let result = CommandResult::new(100, "Reading package lists...\n", "E: Unable to locate package foo\n\n");
        assert_eq!(result.failure_summary(), "E: Unable to locate package foo");
    }

    #[test]
    fn test_failure_summary_without_output() {
        let result = CommandResult::new(3, "", "");
        assert_eq!(result.failure_summary(), "exit status 3");
    }

    #[test]
    fn test_combined_output() {
        assert_eq!(CommandResult::new(0, "out", "").combined_output(), "out");
        assert_eq!(CommandResult::new(0, "out", "err").combined_output(), "out\nerr");
    }
}
