//! Package manager traits

use async_trait::async_trait;
use simtool_exec::{CommandExecutor, CommandResult};

use crate::error::PackageError;
use crate::types::{ActionResult, PackageManagerType};

/// Uniform driver contract over a host package manager
///
/// `package` is always the backend's own identifier (for example `kicad` for
/// apt, `KiCad` for Chocolatey).
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Whether `package` is currently installed
    async fn is_installed(&self, package: &str) -> Result<bool, PackageError> {
        Ok(self.installed_version(package).await?.is_some())
    }

    /// Installed version, `None` when the package is not installed
    async fn installed_version(&self, package: &str) -> Result<Option<String>, PackageError>;

    /// Newest version the backend knows about; may hit the network
    async fn latest_version(&self, package: &str) -> Result<Option<String>, PackageError>;

    /// Install `package`
    async fn install(&self, package: &str) -> Result<ActionResult, PackageError>;

    /// Upgrade `package` to the newest available version
    async fn upgrade(&self, package: &str) -> Result<ActionResult, PackageError>;

    /// Remove `package`
    async fn remove(&self, package: &str) -> Result<ActionResult, PackageError>;

    /// Backend type
    fn manager_type(&self) -> PackageManagerType;

    /// Whether the backend executable is on PATH
    fn is_available(&self) -> bool;
}

/// Fail with `ManagerNotFound` unless one of `programs` is on PATH
pub(crate) fn require_program(
    executor: &dyn CommandExecutor,
    programs: &[&str],
) -> Result<(), PackageError> {
    if programs.iter().any(|p| executor.locate(p).is_some()) {
        Ok(())
    } else {
        Err(PackageError::ManagerNotFound(programs.join(" or ")))
    }
}

/// Default mapping of a failed command to `CommandFailed`
pub(crate) fn command_failed(result: &CommandResult) -> PackageError {
    PackageError::CommandFailed {
        status: result.status,
        message: result.failure_summary(),
    }
}
