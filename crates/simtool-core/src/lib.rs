//! simtool-core: Dependency resolution and install orchestration
//!
//! Holds the tool registry, the dependency resolver, status checking and the
//! `Orchestrator` that drives a `PackageManager` through `list`, `install`,
//! `update` and `uninstall`.

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod state;
pub mod status;
pub mod version;

pub use error::CoreError;
pub use orchestrator::{Orchestrator, PlannedStep};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use report::{OperationResult, Outcome, Report};
pub use resolver::{InstallPlan, resolve, resolve_all};
pub use state::{PlanStep, StepState};
pub use status::{StatusChecker, ToolState, ToolStatus};
pub use version::PackageVersion;
