//! simtool-pkg: Package manager abstraction
//!
//! Provides the `PackageManager` trait, one driver per supported backend
//! (apt, dnf, Chocolatey, Homebrew) and the platform adapter that picks the
//! right driver for the host.

pub mod apt;
pub mod brew;
pub mod choco;
pub mod dnf;
pub mod error;
pub mod platform;
pub mod traits;
pub mod types;

pub use apt::AptManager;
pub use brew::BrewManager;
pub use choco::ChocoManager;
pub use dnf::DnfManager;
pub use error::PackageError;
pub use platform::{DistroInfo, resolve_sudo, select_package_manager};
pub use traits::PackageManager;
pub use types::{ActionResult, PackageAction, PackageManagerType, Platform, SudoPolicy};

#[cfg(test)]
pub(crate) mod testing;
