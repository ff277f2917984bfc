//! Tool status detection

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use simtool_pkg::{PackageError, PackageManager, Platform};
use tracing::{debug, warn};

use crate::registry::ToolDescriptor;
use crate::version::PackageVersion;

/// Installation state of a tool on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolState {
    NotInstalled,
    Installed,
    UpdateAvailable,
    /// The package manager could not be queried
    Unknown,
}

impl fmt::Display for ToolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolState::NotInstalled => "not installed",
            ToolState::Installed => "installed",
            ToolState::UpdateAvailable => "update available",
            ToolState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of one tool's state; computed on demand, never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub tool_id: String,
    pub state: ToolState,
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
}

impl ToolStatus {
    fn new(tool_id: &str, state: ToolState) -> Self {
        Self {
            tool_id: tool_id.to_string(),
            state,
            installed_version: None,
            latest_version: None,
        }
    }

    /// Whether the tool is present, outdated or not
    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(self.state, ToolState::Installed | ToolState::UpdateAvailable)
    }
}

/// Queries the package manager for the state of registry tools
#[derive(Clone)]
pub struct StatusChecker {
    manager: Arc<dyn PackageManager>,
    platform: Platform,
}

impl StatusChecker {
    pub fn new(manager: Arc<dyn PackageManager>, platform: Platform) -> Self {
        Self { manager, platform }
    }

    /// Determine the status of `tool`
    ///
    /// Never fails: a driver that cannot be queried yields `Unknown`, a
    /// failed latest-version lookup leaves `latest_version` empty, and
    /// versions that cannot be ordered leave the tool `Installed`.
    pub async fn status(&self, tool: &ToolDescriptor) -> ToolStatus {
        let packages = tool.packages_for(self.platform);
        let Some(primary) = packages.first() else {
            debug!(tool = %tool.id, platform = %self.platform, "no package for this platform");
            return ToolStatus::new(&tool.id, ToolState::NotInstalled);
        };

        let installed = match self.installed_version(packages).await {
            Ok(version) => version,
            Err(e) => {
                warn!(tool = %tool.id, error = %e, "could not query installed version");
                return ToolStatus::new(&tool.id, ToolState::Unknown);
            }
        };

        let latest = match self.manager.latest_version(primary).await {
            Ok(version) => version,
            Err(e) => {
                warn!(tool = %tool.id, error = %e, "could not query latest version");
                None
            }
        };

        let state = match (&installed, &latest) {
            (None, _) => ToolState::NotInstalled,
            (Some(current), Some(newest)) if Self::is_outdated(&tool.id, current, newest) => {
                ToolState::UpdateAvailable
            }
            (Some(_), _) => ToolState::Installed,
        };

        debug!(tool = %tool.id, %state, ?installed, ?latest, "tool status");
        ToolStatus {
            tool_id: tool.id.clone(),
            state,
            installed_version: installed,
            latest_version: latest,
        }
    }

    /// Version of the primary package, `None` unless every package is installed
    async fn installed_version(&self, packages: &[String]) -> Result<Option<String>, PackageError> {
        let mut primary_version = None;
        for (i, package) in packages.iter().enumerate() {
            match self.manager.installed_version(package).await {
                Ok(Some(version)) => {
                    if i == 0 {
                        primary_version = Some(version);
                    }
                }
                Ok(None) | Err(PackageError::PackageNotFound(_)) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
        Ok(primary_version)
    }

    fn is_outdated(tool_id: &str, installed: &str, latest: &str) -> bool {
        match PackageVersion::is_newer(latest, installed) {
            Ok(newer) => newer,
            Err(e) => {
                warn!(tool = tool_id, installed, latest, error = %e, "cannot compare versions");
                false
            }
        }
    }
}
