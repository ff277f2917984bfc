//! Homebrew package manager (macOS)
//!
//! Queries go through `brew info --json=v2`, which covers both formulae
//! (ngspice) and casks (kicad).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use simtool_exec::{CommandExecutor, CommandLine, CommandResult};
use tracing::{debug, info, instrument};

use crate::error::PackageError;
use crate::traits::{PackageManager, command_failed, require_program};
use crate::types::{ActionResult, PackageAction, PackageManagerType};

#[derive(Debug, Default, Deserialize)]
struct BrewInfo {
    #[serde(default)]
    formulae: Vec<Formula>,
    #[serde(default)]
    casks: Vec<Cask>,
}

#[derive(Debug, Deserialize)]
struct Formula {
    versions: FormulaVersions,
    /// Rebuilds of the same upstream version, installed as `<stable>_<revision>`
    #[serde(default)]
    revision: u32,
    #[serde(default)]
    installed: Vec<InstalledKeg>,
}

impl Formula {
    fn latest(&self) -> Option<String> {
        let stable = self.versions.stable.as_deref()?;
        Some(match self.revision {
            0 => stable.to_string(),
            revision => format!("{stable}_{revision}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FormulaVersions {
    stable: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstalledKeg {
    version: String,
}

#[derive(Debug, Deserialize)]
struct Cask {
    version: Option<String>,
    installed: Option<String>,
}

/// Installed and latest versions for one name
#[derive(Debug, Default, PartialEq, Eq)]
struct Versions {
    installed: Option<String>,
    latest: Option<String>,
}

/// Homebrew package manager implementation
///
/// Homebrew refuses to run as root, so commands never use sudo.
pub struct BrewManager {
    executor: Arc<dyn CommandExecutor>,
}

impl BrewManager {
    /// Create a new Homebrew manager
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    fn brew(args: &[&str]) -> CommandLine {
        CommandLine::new("brew")
            .args(args.iter().copied())
            .env("HOMEBREW_NO_AUTO_UPDATE", "1")
    }

    /// Parse `brew info --json=v2` output
    fn parse_info(json: &str) -> Result<Versions, PackageError> {
        let info: BrewInfo =
            serde_json::from_str(json).map_err(|e| PackageError::ParseError(e.to_string()))?;

        if let Some(formula) = info.formulae.into_iter().next() {
            return Ok(Versions {
                latest: formula.latest(),
                installed: formula.installed.into_iter().last().map(|k| k.version),
            });
        }
        if let Some(cask) = info.casks.into_iter().next() {
            return Ok(Versions {
                installed: cask.installed,
                latest: cask.version,
            });
        }
        Ok(Versions::default())
    }

    fn is_unknown_name(result: &CommandResult) -> bool {
        result.stderr.contains("No available formula")
            || result.stderr.contains("No formulae or casks found")
    }

    async fn info(&self, package: &str) -> Result<Versions, PackageError> {
        require_program(self.executor.as_ref(), &["brew"])?;

        let result = self
            .executor
            .run(&Self::brew(&["info", "--json=v2", package]))
            .await?;

        if !result.success() {
            if Self::is_unknown_name(&result) {
                debug!(package, "homebrew does not know this name");
                return Ok(Versions::default());
            }
            return Err(command_failed(&result));
        }

        Self::parse_info(&result.stdout)
    }

    async fn mutate(
        &self,
        package: &str,
        action: PackageAction,
        verb: &str,
    ) -> Result<ActionResult, PackageError> {
        require_program(self.executor.as_ref(), &["brew"])?;

        let result = self.executor.run(&Self::brew(&[verb, package])).await?;

        if !result.success() {
            if Self::is_unknown_name(&result) {
                return Err(PackageError::PackageNotFound(package.to_string()));
            }
            if result.stderr.contains("has already locked") {
                return Err(PackageError::LockConflict(result.failure_summary()));
            }
            return Err(command_failed(&result));
        }

        info!(package, %action, "homebrew operation completed");
        Ok(ActionResult::new(package, action))
    }
}

#[async_trait]
impl PackageManager for BrewManager {
    #[instrument(skip(self))]
    async fn installed_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        Ok(self.info(package).await?.installed)
    }

    #[instrument(skip(self))]
    async fn latest_version(&self, package: &str) -> Result<Option<String>, PackageError> {
        Ok(self.info(package).await?.latest)
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
        PackageManagerType::Homebrew
    }

    fn is_available(&self) -> bool {
        self.executor.locate("brew").is_some()
    }
}
