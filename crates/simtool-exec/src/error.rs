//! Error types for simtool-exec

use thiserror::Error;

/// Errors that can occur while running a host command
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Program is not installed or not on PATH
    #[error("program not found: {0}")]
    ProgramNotFound(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    IoError(String),
}
