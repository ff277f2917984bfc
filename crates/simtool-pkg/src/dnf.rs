//! DNF package manager (Fedora/RHEL/CentOS)

use std::sync::Arc;

use async_trait::async_trait;
use simtool_exec::{CommandExecutor, CommandLine, CommandResult};
use tracing::{info, instrument};

use crate::error::PackageError;
use crate::traits::{PackageManager, command_failed, require_program};
use crate::types::{ActionResult, PackageAction, PackageManagerType};

/// rpm/repoquery format producing `VERSION-RELEASE`
const VERSION_FORMAT: &str = "%{version}-%{release}\\n";

/// DNF package manager implementation
///
/// Falls back to `yum` if `dnf` is not available.
pub struct DnfManager {
    executor: Arc<dyn CommandExecutor>,
    use_sudo: bool,
    /// Whether to use yum instead of dnf
    use_yum: bool,
}

impl DnfManager {
    /// Create a new DNF manager
    pub fn new(executor: Arc<dyn CommandExecutor>, use_sudo: bool) -> Self {
        Self {
            executor,
            use_sudo,
            use_yum: false,
        }
    }

    /// Create a manager that uses yum when dnf is not on PATH
    pub fn detect(executor: Arc<dyn CommandExecutor>, use_sudo: bool) -> Self {
        let use_yum = executor.locate("dnf").is_none() && executor.locate("yum").is_some();
        Self {
            executor,
            use_sudo,
            use_yum,
        }
    }

    fn tool(&self) -> &'static str {
        if self.use_yum { "yum" } else { "dnf" }
    }

    /// Build dnf/yum command with optional sudo
    fn pkg_cmd(&self, args: &[&str]) -> CommandLine {
        CommandLine::new(self.tool())
            .args(args.iter().copied())
            .with_sudo(self.use_sudo)
    }

    /// Last non-empty line of query output
    ///
    /// repoquery may print metadata progress before the answer.
    fn parse_version_line(output: &str) -> Option<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("Last metadata"))
            .last()
            .map(str::to_string)
    }

    /// Classify a failed dnf/yum run
    fn classify_failure(package: &str, result: &CommandResult) -> PackageError {
        let output = result.combined_output();
        if output.contains("No match for argument")
            || output.contains("No package")
            || output.contains("Unable to find a match")
        {
            PackageError::PackageNotFound(package.to_string())
        } else if output.contains("superuser privileges") || output.contains("Permission denied") {
            PackageError::PermissionDenied(result.failure_summary())
        } else if output.contains("lock") {
            PackageError::LockConflict(result.failure_summary())
        } else {
            command_failed(result)
        }
    }

    async fn mutate(
        &self,
        package: &str,
        action: PackageAction,
        verb: &str,
    ) -> Result<ActionResult, PackageError> {
        require_program(self.executor.as_ref(), &[self.tool()])?;

        let cmd = self.pkg_cmd(&[verb, "-y", package]);
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(Self::classify_failure(package, &result));
        }

        info!(package, %action, tool = self.tool(), "dnf operation completed");
        Ok(ActionResult::new(package, action))
    }
}

#[async_trait]
impl PackageManager for DnfManager {
    #[instrument(skip(self))]
    async fn installed_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        require_program(self.executor.as_ref(), &["rpm"])?;

        let cmd = CommandLine::new("rpm")
            .args(["-q", "--queryformat", VERSION_FORMAT, package])
            .env("LC_ALL", "C");
        let result = self.executor.run(&cmd).await?;

        // rpm -q exits 1 with "package X is not installed"
        if !result.success() {
            if result.combined_output().contains("is not installed") {
                return Ok(None);
            }
            return Err(command_failed(&result));
        }

        Ok(Self::parse_version_line(&result.stdout))
    }

    #[instrument(skip(self))]
    async fn latest_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        // yum ships repoquery as a separate yum-utils binary
        let cmd = if self.use_yum {
            require_program(self.executor.as_ref(), &["repoquery"])?;
            CommandLine::new("repoquery")
        } else {
            require_program(self.executor.as_ref(), &["dnf"])?;
            CommandLine::new("dnf").args(["repoquery", "-q"])
        };
        let cmd = cmd
            .args(["--latest-limit", "1", "--queryformat", VERSION_FORMAT, package])
            .env("LC_ALL", "C");
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(command_failed(&result));
        }

        Ok(Self::parse_version_line(&result.stdout))
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
        self.mutate(package, PackageAction::Remove, "remove").await
    }

    fn manager_type(&self) -> PackageManagerType {
        PackageManagerType::Dnf
    }

    fn is_available(&self) -> bool {
        self.executor.locate("dnf").is_some() || self.executor.locate("yum").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;

    #[test]
    fn test_parse_version_line() {
        let output = "Last metadata expiration check: 0:05:31 ago.\n42-1.fc40\n";
        assert_eq!(
            DnfManager::parse_version_line(output).as_deref(),
            Some("42-1.fc40")
        );
        assert_eq!(DnfManager::parse_version_line("\n"), None);
    }

    #[tokio::test]
    async fn test_not_installed_is_none() {
        let executor = ScriptedExecutor::new(&["dnf", "rpm"]).respond(
            r"rpm -q --queryformat %{version}-%{release}\n xyce",
            1,
            "package xyce is not installed\n",
            "",
        );
        let dnf = DnfManager::new(Arc::new(executor), false);

        assert_eq!(dnf.installed_version("xyce").await.unwrap(), None);
        assert!(!dnf.is_installed("xyce").await.unwrap());
    }

    #[tokio::test]
    async fn test_latest_version_via_repoquery() {
        let executor = ScriptedExecutor::new(&["dnf", "rpm"]).respond(
            r"dnf repoquery -q --latest-limit 1 --queryformat %{version}-%{release}\n ngspice",
            0,
            "43-1.fc41\n",
            "",
        );
        let dnf = DnfManager::new(Arc::new(executor), false);

        assert_eq!(
            dnf.latest_version("ngspice").await.unwrap().as_deref(),
            Some("43-1.fc41")
        );
    }

    #[tokio::test]
    async fn test_detect_falls_back_to_yum() {
        let executor = Arc::new(
            ScriptedExecutor::new(&["yum", "rpm"]).respond("sudo yum install -y ngspice", 0, "Complete!", ""),
        );
        let dnf = DnfManager::detect(executor.clone(), true);

        assert!(dnf.is_available());
        dnf.install("ngspice").await.unwrap();
        assert_eq!(executor.commands(), vec!["sudo yum install -y ngspice"]);
    }

    #[tokio::test]
    async fn test_upgrade_no_match() {
        let executor = ScriptedExecutor::new(&["dnf"]).respond(
            "dnf upgrade -y kicad",
            1,
            "",
            "Error: No match for argument: kicad",
        );
        let dnf = DnfManager::new(Arc::new(executor), false);

        let err = dnf.upgrade("kicad").await.unwrap_err();
        assert!(matches!(err, PackageError::PackageNotFound(_)));
    }
}
