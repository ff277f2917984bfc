//! Platform detection and package manager selection

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use simtool_exec::{CommandExecutor, CommandLine};
use tracing::{debug, info, warn};

use crate::apt::AptManager;
use crate::brew::BrewManager;
use crate::choco::ChocoManager;
use crate::dnf::DnfManager;
use crate::traits::PackageManager;
use crate::types::{PackageManagerType, Platform, SudoPolicy};

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

const APT_FAMILY: [&str; 6] = ["debian", "ubuntu", "linuxmint", "pop", "raspbian", "elementary"];
const DNF_FAMILY: [&str; 6] = ["fedora", "rhel", "centos", "rocky", "almalinux", "ol"];

/// Detected distribution information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistroInfo {
    /// Distribution ID (debian, ubuntu, fedora, etc.)
    pub id: String,
    /// Parent distributions from `ID_LIKE`
    pub id_like: Vec<String>,
    /// Distribution name
    pub name: String,
    /// Version ID
    pub version_id: String,
}

impl DistroInfo {
    /// Parse the contents of an `os-release` file
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut info = DistroInfo::default();

        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            match key {
                "ID" => info.id = value.to_ascii_lowercase(),
                "ID_LIKE" => {
                    info.id_like = value
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect();
                }
                "NAME" => info.name = value.to_string(),
                "VERSION_ID" => info.version_id = value.to_string(),
                _ => {}
            }
        }

        info
    }

    /// Read the host's `os-release`, if any
    #[must_use]
    pub fn detect() -> Option<Self> {
        OS_RELEASE_PATHS.iter().find_map(|path| {
            let content = std::fs::read_to_string(Path::new(path)).ok()?;
            let info = Self::parse(&content);
            debug!(path, id = %info.id, "read os-release");
            (!info.id.is_empty()).then_some(info)
        })
    }

    /// Package manager family of this distribution, checking `ID` before `ID_LIKE`
    #[must_use]
    pub fn package_manager(&self) -> Option<PackageManagerType> {
        std::iter::once(&self.id)
            .chain(self.id_like.iter())
            .find_map(|id| {
                if APT_FAMILY.contains(&id.as_str()) {
                    Some(PackageManagerType::Apt)
                } else if DNF_FAMILY.contains(&id.as_str()) {
                    Some(PackageManagerType::Dnf)
                } else {
                    None
                }
            })
    }
}

/// Probe PATH for a Linux package manager
fn probe_linux(executor: &dyn CommandExecutor) -> Option<PackageManagerType> {
    if executor.locate("apt-get").is_some() {
        Some(PackageManagerType::Apt)
    } else if executor.locate("dnf").is_some() || executor.locate("yum").is_some() {
        Some(PackageManagerType::Dnf)
    } else {
        None
    }
}

/// Pick the driver for this host
///
/// Always returns a driver. When the backend is missing from PATH the driver
/// reports `ManagerNotFound` from each call, so the failure lands on the
/// individual steps instead of aborting the command.
pub fn select_package_manager(
    platform: Platform,
    distro: Option<&DistroInfo>,
    executor: Arc<dyn CommandExecutor>,
    use_sudo: bool,
) -> Arc<dyn PackageManager> {
    let manager: Arc<dyn PackageManager> = match platform {
        Platform::Windows => Arc::new(ChocoManager::new(executor)),
        Platform::Macos => Arc::new(BrewManager::new(executor)),
        Platform::Linux => {
            let kind = distro
                .and_then(DistroInfo::package_manager)
                .or_else(|| probe_linux(executor.as_ref()));
            match kind {
                Some(PackageManagerType::Dnf) => Arc::new(DnfManager::detect(executor, use_sudo)),
                Some(_) => Arc::new(AptManager::new(executor, use_sudo)),
                None => {
                    warn!("no supported package manager found (tried apt-get, dnf, yum)");
                    Arc::new(AptManager::new(executor, use_sudo))
                }
            }
        }
    };

    info!(
        %platform,
        manager = %manager.manager_type(),
        available = manager.is_available(),
        use_sudo,
        "selected package manager"
    );
    manager
}

/// Decide whether mutating commands go through sudo
///
/// Only Linux backends use sudo. `Auto` checks `id -u` and treats any failure
/// to determine the uid as "not root".
pub async fn resolve_sudo(
    policy: SudoPolicy,
    platform: Platform,
    executor: &dyn CommandExecutor,
) -> bool {
    if platform != Platform::Linux {
        return false;
    }
    match policy {
        SudoPolicy::Always => true,
        SudoPolicy::Never => false,
        SudoPolicy::Auto => {
            let uid = executor.run(&CommandLine::new("id").arg("-u")).await;
            uid.as_ref()
                .map(|r| !r.success() || r.stdout.trim() != "0")
                .unwrap_or(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 24.04.1 LTS"
NAME="Ubuntu"
VERSION_ID="24.04"
ID=ubuntu
ID_LIKE=debian
"#;

    const ROCKY: &str = r#"NAME="Rocky Linux"
VERSION_ID="9.4"
ID="rocky"
ID_LIKE="rhel centos fedora"
"#;

    #[test]
    fn test_parse_os_release() {
        let info = DistroInfo::parse(UBUNTU);
        assert_eq!(info.id, "ubuntu");
        assert_eq!(info.id_like, vec!["debian"]);
        assert_eq!(info.name, "Ubuntu");
        assert_eq!(info.version_id, "24.04");
        assert_eq!(info.package_manager(), Some(PackageManagerType::Apt));
    }

    #[test]
    fn test_id_like_fallback() {
        let info = DistroInfo::parse(ROCKY);
        assert_eq!(info.package_manager(), Some(PackageManagerType::Dnf));

        let derived = DistroInfo::parse("ID=kali\nID_LIKE=debian\n");
        assert_eq!(derived.package_manager(), Some(PackageManagerType::Apt));

        let unknown = DistroInfo::parse("ID=arch\n");
        assert_eq!(unknown.package_manager(), None);
    }

    #[test]
    fn test_select_by_platform() {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ScriptedExecutor::new(&[]));

        let windows = select_package_manager(Platform::Windows, None, executor.clone(), false);
        assert_eq!(windows.manager_type(), PackageManagerType::Chocolatey);

        let macos = select_package_manager(Platform::Macos, None, executor.clone(), false);
        assert_eq!(macos.manager_type(), PackageManagerType::Homebrew);
        assert!(!macos.is_available());
    }

    #[test]
    fn test_select_linux_by_distro_then_probe() {
        let fedora = DistroInfo::parse("ID=fedora\n");
        let executor: Arc<dyn CommandExecutor> = Arc::new(ScriptedExecutor::new(&["dnf"]));

        let by_distro =
            select_package_manager(Platform::Linux, Some(&fedora), executor.clone(), true);
        assert_eq!(by_distro.manager_type(), PackageManagerType::Dnf);

        let by_probe = select_package_manager(Platform::Linux, None, executor, true);
        assert_eq!(by_probe.manager_type(), PackageManagerType::Dnf);

        let nothing: Arc<dyn CommandExecutor> = Arc::new(ScriptedExecutor::new(&[]));
        let fallback = select_package_manager(Platform::Linux, None, nothing, true);
        assert_eq!(fallback.manager_type(), PackageManagerType::Apt);
        assert!(!fallback.is_available());
    }

    #[tokio::test]
    async fn test_resolve_sudo() {
        let root = ScriptedExecutor::new(&["id"]).respond("id -u", 0, "0\n", "");
        let user = ScriptedExecutor::new(&["id"]).respond("id -u", 0, "1000\n", "");

        assert!(!resolve_sudo(SudoPolicy::Auto, Platform::Linux, &root).await);
        assert!(resolve_sudo(SudoPolicy::Auto, Platform::Linux, &user).await);
        assert!(!resolve_sudo(SudoPolicy::Never, Platform::Linux, &user).await);
        assert!(resolve_sudo(SudoPolicy::Always, Platform::Linux, &root).await);
        assert!(!resolve_sudo(SudoPolicy::Always, Platform::Macos, &user).await);
    }
}
