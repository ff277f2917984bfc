//! Command executor trait

use std::path::PathBuf;

use async_trait::async_trait;

use crate::command::CommandLine;
use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs commands on the host
///
/// A non-zero exit status is not an error: callers inspect
/// [`CommandResult::status`] and decide what it means for their backend.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion, capturing stdout and stderr
    async fn run(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError>;

    /// Resolve a program name against PATH
    fn locate(&self, program: &str) -> Option<PathBuf>;
}
