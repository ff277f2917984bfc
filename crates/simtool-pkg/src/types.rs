//! Type definitions for package management

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PackageError;

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux (apt or dnf)
    Linux,
    /// Windows (Chocolatey)
    Windows,
    /// macOS (Homebrew)
    #[serde(alias = "darwin")]
    Macos,
}

impl Platform {
    /// All supported platforms
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Windows, Platform::Macos];

    /// Map a `std::env::consts::OS` value to a platform
    #[must_use]
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(Platform::Linux),
            "windows" => Some(Platform::Windows),
            "macos" | "darwin" => Some(Platform::Macos),
            _ => None,
        }
    }

    /// Platform of the running process
    ///
    /// # Errors
    /// Returns `PackageError::UnsupportedPlatform` on any other OS
    pub fn current() -> Result<Self, PackageError> {
        let os = std::env::consts::OS;
        Self::from_os(os).ok_or_else(|| PackageError::UnsupportedPlatform(os.to_string()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::Windows => write!(f, "windows"),
            Platform::Macos => write!(f, "macos"),
        }
    }
}

/// Package manager type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManagerType {
    /// APT (Debian/Ubuntu)
    Apt,
    /// DNF or YUM (Fedora/RHEL/CentOS)
    Dnf,
    /// Chocolatey (Windows)
    Chocolatey,
    /// Homebrew (macOS)
    Homebrew,
}

impl fmt::Display for PackageManagerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageManagerType::Apt => write!(f, "apt"),
            PackageManagerType::Dnf => write!(f, "dnf"),
            PackageManagerType::Chocolatey => write!(f, "chocolatey"),
            PackageManagerType::Homebrew => write!(f, "homebrew"),
        }
    }
}

/// Mutating operation performed on a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageAction {
    Install,
    Upgrade,
    Remove,
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageAction::Install => write!(f, "install"),
            PackageAction::Upgrade => write!(f, "upgrade"),
            PackageAction::Remove => write!(f, "remove"),
        }
    }
}

/// Result of a successful install, upgrade or remove
///
/// Failures are reported as `PackageError` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Backend package identifier
    pub package: String,
    /// Operation that was performed
    pub action: PackageAction,
    /// Whether the backend asked for a reboot
    pub reboot_required: bool,
}

impl ActionResult {
    /// Create a result for `package`
    pub fn new(package: impl Into<String>, action: PackageAction) -> Self {
        Self {
            package: package.into(),
            action,
            reboot_required: false,
        }
    }

    /// Mark reboot as required
    #[must_use]
    pub fn with_reboot(mut self) -> Self {
        self.reboot_required = true;
        self
    }
}

/// When to prefix mutating commands with `sudo`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SudoPolicy {
    /// Use sudo on Linux unless already running as root
    #[default]
    Auto,
    /// Always use sudo on Linux
    Always,
    /// Never use sudo
    Never,
}

impl FromStr for SudoPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SudoPolicy::Auto),
            "always" => Ok(SudoPolicy::Always),
            "never" => Ok(SudoPolicy::Never),
            other => Err(format!(
                "invalid sudo policy '{other}' (expected auto, always or never)"
            )),
        }
    }
}
