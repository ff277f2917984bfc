//! Chocolatey package manager (Windows)

use std::sync::Arc;

use async_trait::async_trait;
use simtool_exec::{CommandExecutor, CommandLine, CommandResult};
use tracing::{info, instrument, warn};

use crate::error::PackageError;
use crate::traits::{PackageManager, command_failed, require_program};
use crate::types::{ActionResult, PackageAction, PackageManagerType};

/// Exit codes Chocolatey uses for "succeeded, reboot pending"
const REBOOT_EXIT_CODES: [i32; 2] = [1641, 3010];

/// Chocolatey package manager implementation
///
/// Targets Chocolatey 2.x, where `choco list` only reports local packages.
pub struct ChocoManager {
    executor: Arc<dyn CommandExecutor>,
}

impl ChocoManager {
    /// Create a new Chocolatey manager
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Find `package`'s version in `--limit-output` lines (`name|version`)
    fn parse_limit_output(output: &str, package: &str) -> Option<String> {
        output.lines().find_map(|line| {
            let (name, version) = line.trim().split_once('|')?;
            name.eq_ignore_ascii_case(package)
                .then(|| version.trim().to_string())
        })
    }

    /// Classify a failed choco run
    fn classify_failure(package: &str, result: &CommandResult) -> PackageError {
        let output = result.combined_output();
        if output.contains("not found") || output.contains("was not found with the source") {
            PackageError::PackageNotFound(package.to_string())
        } else if output.contains("elevated") || output.contains("Access to the path") {
            PackageError::PermissionDenied(
                "Chocolatey requires an administrator shell".to_string(),
            )
        } else if output.contains("lock file") {
            PackageError::LockConflict(result.failure_summary())
        } else {
            command_failed(result)
        }
    }

    async fn query(&self, verb: &str, package: &str) -> Result<Option<String>, PackageError> {
        require_program(self.executor.as_ref(), &["choco"])?;

        let cmd = CommandLine::new("choco").args([verb, "--exact", "--limit-output", package]);
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(command_failed(&result));
        }

        Ok(Self::parse_limit_output(&result.stdout, package))
    }

    async fn mutate(
        &self,
        package: &str,
        action: PackageAction,
        verb: &str,
    ) -> Result<ActionResult, PackageError> {
        require_program(self.executor.as_ref(), &["choco"])?;

        let cmd = CommandLine::new("choco").args([verb, package, "-y", "--no-progress"]);
        let result = self.executor.run(&cmd).await?;

        if REBOOT_EXIT_CODES.contains(&result.status) {
            warn!(package, %action, status = result.status, "reboot required to finish");
            return Ok(ActionResult::new(package, action).with_reboot());
        }

        if !result.success() {
            return Err(Self::classify_failure(package, &result));
        }

        info!(package, %action, "chocolatey operation completed");
        Ok(ActionResult::new(package, action))
    }
}

#[async_trait]
impl PackageManager for ChocoManager {
    #[instrument(skip(self))]
    async fn installed_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        self.query("list", package).await
    }

    #[instrument(skip(self))]
    async fn latest_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        self.query("search", package).await
    }

    #[instrument(skip(self))]
    async fn install(&self, package: &str) -> Result<ActionResult, PackageError> {
        self.mutate(package, PackageAction::Install, "install").await
    }

    #[instrument(skip(self))]
    async fn upgrade(&self, package: &str) -> Result<ActionResult, PackageError> {
        self.mutate(package, PackageAction::Upgrade, "upgrade").await
    }

    #[instrument(skip(self))]
    async fn remove(&self, package: &str) -> Result<ActionResult, PackageError> {
        self.mutate(package, PackageAction::Remove, "uninstall").await
    }

    fn manager_type(&self) -> PackageManagerType {
        PackageManagerType::Chocolatey
    }

    fn is_available(&self) -> bool {
        self.executor.locate("choco").is_some()
    }
}
