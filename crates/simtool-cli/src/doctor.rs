//! Host diagnostics for `simtool doctor`

use serde::Serialize;
use simtool_core::{Orchestrator, resolve_all};
use simtool_pkg::{DistroInfo, PackageManagerType, Platform};

/// What `simtool` detected about this host
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub platform: Platform,
    pub distro: Option<DistroInfo>,
    pub package_manager: PackageManagerType,
    pub manager_available: bool,
    pub use_sudo: bool,
    /// Registry file in use, `None` for the built-in catalog
    pub registry_source: Option<String>,
    pub tool_count: usize,
    /// Dependency problem found while resolving every tool
    pub registry_error: Option<String>,
}

impl Diagnostics {
    pub fn collect(
        orchestrator: &Orchestrator,
        distro: Option<&DistroInfo>,
        use_sudo: bool,
        registry_source: Option<String>,
    ) -> Self {
        let manager = orchestrator.manager();
        Self {
            platform: orchestrator.platform(),
            distro: distro.cloned(),
            package_manager: manager.manager_type(),
            manager_available: manager.is_available(),
            use_sudo,
            registry_source,
            tool_count: orchestrator.registry().len(),
            registry_error: resolve_all(orchestrator.registry())
                .err()
                .map(|e| e.to_string()),
        }
    }

    /// Healthy when the package manager is present and the registry resolves
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.manager_available && self.registry_error.is_none()
    }
}
