//! Core error types for simtool-core

use simtool_pkg::PackageError;
use thiserror::Error;

use crate::state::StepState;

/// Errors that can occur while planning or executing tool operations
///
/// `UnknownTool`, `CyclicDependency` and `Config` abort a command before the
/// host is touched. `DriverUnavailable` and `PackageOperationFailed` are
/// recorded per step in the report.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Requested tool id is not in the registry
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Registry declares a dependency cycle
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Tool ids along the cycle, first and last entry equal
        cycle: Vec<String>,
    },

    /// Host package manager is missing
    #[error("package manager unavailable: {0}")]
    DriverUnavailable(String),

    /// Install, upgrade or remove command failed
    #[error("{tool}: {message}")]
    PackageOperationFailed {
        /// Tool the step belonged to
        tool: String,
        /// Failure description from the driver
        message: String,
    },

    /// Version string has no numeric component to order by
    #[error("unparsable version: {0}")]
    UnparsableVersion(String),

    /// Invalid step state transition attempted
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: StepState,
        /// Attempted target state
        to: StepState,
    },

    /// Registry or settings are malformed
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Convert a driver error for a step of `tool`
    ///
    /// Permission and lock failures carry a hint on what the user can do.
    pub fn from_package(tool: impl Into<String>, err: PackageError) -> Self {
        if err.is_manager_missing() {
            return CoreError::DriverUnavailable(err.to_string());
        }

        let hint = if err.needs_sudo() {
            " (run as root or with --sudo always)"
        } else if err.is_retryable() {
            " (another package manager is running, retry later)"
        } else {
            ""
        };
        CoreError::PackageOperationFailed {
            tool: tool.into(),
            message: format!("{err}{hint}"),
        }
    }

    /// Whether this error aborts a command before any host mutation
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownTool(_) | CoreError::CyclicDependency { .. } | CoreError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = CoreError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_from_package_error() {
        let missing = CoreError::from_package("kicad", PackageError::ManagerNotFound("brew".into()));
        assert!(matches!(missing, CoreError::DriverUnavailable(_)));
        assert!(!missing.is_configuration_error());

        let failed = CoreError::from_package(
            "kicad",
            PackageError::PackageNotFound("kicad".into()),
        );
        assert_eq!(failed.to_string(), "kicad: package not found: kicad");

        let platform = CoreError::from_package(
            "xyce",
            PackageError::UnsupportedPlatform("freebsd".into()),
        );
        assert_eq!(
            platform.to_string(),
            "package manager unavailable: unsupported platform: freebsd"
        );
    }

    #[test]
    fn test_from_package_error_hints() {
        let denied = CoreError::from_package(
            "ngspice",
            PackageError::PermissionDenied("are you root?".into()),
        );
        assert_eq!(
            denied.to_string(),
            "ngspice: insufficient permissions: are you root? (run as root or with --sudo always)"
        );

        let locked = CoreError::from_package(
            "kicad",
            PackageError::LockConflict("/var/lib/dpkg/lock-frontend".into()),
        );
        assert_eq!(
            locked.to_string(),
            "kicad: lock file conflict: /var/lib/dpkg/lock-frontend \
             (another package manager is running, retry later)"
        );
    }
}
