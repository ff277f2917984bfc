//! APT package manager (Debian/Ubuntu)

use std::sync::Arc;

use async_trait::async_trait;
use simtool_exec::{CommandExecutor, CommandLine, CommandResult};
use tracing::{debug, info, instrument};

use crate::error::PackageError;
use crate::traits::{PackageManager, command_failed, require_program};
use crate::types::{ActionResult, PackageAction, PackageManagerType};

/// Installed and candidate versions from `apt-cache policy`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PolicyInfo {
    installed: Option<String>,
    candidate: Option<String>,
}

/// APT package manager implementation
pub struct AptManager {
    /// Executor for running commands
    executor: Arc<dyn CommandExecutor>,
    /// Whether to use sudo
    use_sudo: bool,
}

impl AptManager {
    /// Create a new APT manager
    ///
    /// # Arguments
    /// * `executor` - Executor for running apt commands
    /// * `use_sudo` - Whether to prefix mutating commands with sudo
    pub fn new(executor: Arc<dyn CommandExecutor>, use_sudo: bool) -> Self {
        Self { executor, use_sudo }
    }

    /// Build a mutating apt-get command
    fn apt_get(&self, args: &[&str]) -> CommandLine {
        CommandLine::new("apt-get")
            .args(args.iter().copied())
            .env("DEBIAN_FRONTEND", "noninteractive")
            .with_sudo(self.use_sudo)
    }

    /// Parse `apt-cache policy <pkg>` output
    ///
    /// Returns `None` when apt does not know the package at all (empty output).
    fn parse_policy(output: &str) -> Option<PolicyInfo> {
        let mut info = PolicyInfo::default();
        let mut seen = false;

        for line in output.lines() {
            let line = line.trim();
            let (key, value) = match line.split_once(':') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => continue,
            };
            let value = (value != "(none)" && !value.is_empty()).then(|| value.to_string());
            match key {
                "Installed" => {
                    info.installed = value;
                    seen = true;
                }
                "Candidate" => {
                    info.candidate = value;
                    seen = true;
                }
                _ => {}
            }
        }

        seen.then_some(info)
    }

    async fn policy(&self, package: &str) -> Result<Option<PolicyInfo>, PackageError> {
        require_program(self.executor.as_ref(), &["apt-cache"])?;

        let cmd = CommandLine::new("apt-cache")
            .args(["policy", package])
            .env("LC_ALL", "C");
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(command_failed(&result));
        }

        Ok(Self::parse_policy(&result.stdout))
    }

    /// Classify a failed apt-get run
    fn classify_failure(package: &str, result: &CommandResult) -> PackageError {
        let output = result.combined_output();
        if output.contains("Could not get lock") || output.contains("Unable to acquire the dpkg") {
            PackageError::LockConflict(result.failure_summary())
        } else if output.contains("Permission denied") || output.contains("are you root?") {
            PackageError::PermissionDenied(result.failure_summary())
        } else if output.contains("Unable to locate package")
            || output.contains("has no installation candidate")
        {
            PackageError::PackageNotFound(package.to_string())
        } else {
            command_failed(result)
        }
    }

    async fn mutate(
        &self,
        package: &str,
        action: PackageAction,
        args: &[&str],
    ) -> Result<ActionResult, PackageError> {
        require_program(self.executor.as_ref(), &["apt-get"])?;

        let cmd = self.apt_get(args);
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(Self::classify_failure(package, &result));
        }

        info!(package, %action, "apt operation completed");
        Ok(ActionResult::new(package, action))
    }
}

#[async_trait]
impl PackageManager for AptManager {
    #[instrument(skip(self))]
    async fn installed_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        let policy = self.policy(package).await?;
        debug!(?policy, "apt policy");
        Ok(policy.and_then(|p| p.installed))
    }

    #[instrument(skip(self))]
    async fn latest_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        Ok(self.policy(package).await?.and_then(|p| p.candidate))
    }

    #[instrument(skip(self))]
    async fn install(&self, package: &str) -> Result<ActionResult, PackageError> {
        info!("starting apt install");
        self.mutate(package, PackageAction::Install, &["install", "-y", package])
            .await
    }

    #[instrument(skip(self))]
    async fn upgrade(&self, package: &str) -> Result<ActionResult, PackageError> {
        info!("starting apt upgrade");
        self.mutate(
            package,
            PackageAction::Upgrade,
            &["install", "--only-upgrade", "-y", package],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, package: &str) -> Result<ActionResult, PackageError> {
        info!("starting apt remove");
        self.mutate(package, PackageAction::Remove, &["remove", "-y", package])
            .await
    }

    fn manager_type(&self) -> PackageManagerType {
        PackageManagerType::Apt
    }

    fn is_available(&self) -> bool {
        self.executor.locate("apt-get").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;

    const POLICY_INSTALLED: &str = r"ngspice:
  Installed: 38+ds-1
  Candidate: 40+ds-1
  Version table:
     40+ds-1 500
        500 http://deb.debian.org/debian trixie/main amd64 Packages
 *** 38+ds-1 100
        100 /var/lib/dpkg/status";

    const POLICY_MISSING: &str = r"kicad:
  Installed: (none)
  Candidate: 7.0.11+dfsg-1
  Version table:";

    #[test]
    fn test_parse_policy_installed() {
        let info = AptManager::parse_policy(POLICY_INSTALLED).unwrap();
        assert_eq!(info.installed.as_deref(), Some("38+ds-1"));
        assert_eq!(info.candidate.as_deref(), Some("40+ds-1"));
    }

    #[test]
    fn test_parse_policy_not_installed() {
        let info = AptManager::parse_policy(POLICY_MISSING).unwrap();
        assert_eq!(info.installed, None);
        assert_eq!(info.candidate.as_deref(), Some("7.0.11+dfsg-1"));
    }

    #[test]
    fn test_parse_policy_unknown_package() {
        assert_eq!(AptManager::parse_policy(""), None);
    }

    #[tokio::test]
    async fn test_installed_version_uses_policy() {
        let executor = ScriptedExecutor::new(&["apt-get", "apt-cache"])
            .respond("apt-cache policy ngspice", 0, POLICY_INSTALLED, "");
        let apt = AptManager::new(Arc::new(executor), false);

        assert_eq!(
            apt.installed_version("ngspice").await.unwrap().as_deref(),
            Some("38+ds-1")
        );
        assert_eq!(
            apt.latest_version("ngspice").await.unwrap().as_deref(),
            Some("40+ds-1")
        );
        assert!(apt.is_installed("ngspice").await.unwrap());
    }

    #[tokio::test]
    async fn test_install_with_sudo() {
        let executor = Arc::new(
            ScriptedExecutor::new(&["apt-get", "apt-cache"])
                .respond(
                    "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y ngspice",
                    0,
                    "",
                    "",
                ),
        );
        let apt = AptManager::new(executor.clone(), true);

        let result = apt.install("ngspice").await.unwrap();

        assert_eq!(result.action, PackageAction::Install);
        assert_eq!(
            executor.commands(),
            vec!["sudo DEBIAN_FRONTEND=noninteractive apt-get install -y ngspice"]
        );
    }

    #[tokio::test]
    async fn test_install_lock_conflict() {
        let executor = ScriptedExecutor::new(&["apt-get"]).respond(
            "apt-get install -y ngspice",
            100,
            "",
            "E: Could not get lock /var/lib/dpkg/lock-frontend. It is held by process 1234 (apt)",
        );
        let apt = AptManager::new(Arc::new(executor), false);

        let err = apt.install("ngspice").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_install_unknown_package() {
        let executor = ScriptedExecutor::new(&["apt-get"]).respond(
            "apt-get install -y nosuchtool",
            100,
            "",
            "E: Unable to locate package nosuchtool",
        );
        let apt = AptManager::new(Arc::new(executor), false);

        let err = apt.install("nosuchtool").await.unwrap_err();
        assert!(matches!(err, PackageError::PackageNotFound(p) if p == "nosuchtool"));
    }

    #[tokio::test]
    async fn test_missing_apt_is_manager_not_found() {
        let apt = AptManager::new(Arc::new(ScriptedExecutor::new(&[])), false);

        assert!(!apt.is_available());
        let err = apt.upgrade("ngspice").await.unwrap_err();
        assert!(err.is_manager_missing());
    }
}
