//! Error types for simtool-pkg

use simtool_exec::ExecError;
use thiserror::Error;

/// Errors that can occur during package operations
#[derive(Error, Debug, Clone)]
pub enum PackageError {
    /// Package manager not found on system
    #[error("package manager not found: {0}")]
    ManagerNotFound(String),

    /// Host operating system has no supported package manager
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Package not found in repositories
    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// Lock file conflict (another process running)
    #[error("lock file conflict: {0}")]
    LockConflict(String),

    /// Insufficient permissions (need sudo or an elevated shell)
    #[error("insufficient permissions: {0}")]
    PermissionDenied(String),

    /// Command execution failed
    #[error("command failed: {status} - {message}")]
    CommandFailed {
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Failed to parse command output
    #[error("parse error: {0}")]
    ParseError(String),

    /// Could not run the command at all
    #[error("execution error: {0}")]
    ExecutionError(String),
}

impl PackageError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, PackageError::LockConflict(_))
    }

    /// Check if error indicates need for sudo
    #[must_use]
    pub fn needs_sudo(&self) -> bool {
        matches!(self, PackageError::PermissionDenied(_))
    }

    /// Check if there is no usable backend on this host
    #[must_use]
    pub fn is_manager_missing(&self) -> bool {
        matches!(
            self,
            PackageError::ManagerNotFound(_) | PackageError::UnsupportedPlatform(_)
        )
    }
}

impl From<ExecError> for PackageError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::ProgramNotFound(program) => PackageError::ManagerNotFound(program),
            other => PackageError::ExecutionError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_maps_to_manager_not_found() {
        let err = PackageError::from(ExecError::ProgramNotFound("choco".to_string()));
        assert!(err.is_manager_missing());
    }

    #[test]
    fn test_spawn_error_maps_to_execution_error() {
        let err = PackageError::from(ExecError::SpawnError("boom".to_string()));
        assert!(matches!(err, PackageError::ExecutionError(_)));
        assert!(!err.is_retryable());
    }
}
