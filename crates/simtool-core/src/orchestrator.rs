//! Orchestrator: runs tool commands against the host package manager
//!
//! One command per call, steps strictly in order. Configuration errors
//! (unknown tool, dependency cycle) are returned before any driver call;
//! everything that goes wrong while executing a step lands in the `Report`.

use std::sync::Arc;

use serde::Serialize;
use simtool_pkg::{PackageManager, Platform};
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::registry::{ToolDescriptor, ToolRegistry};
use crate::report::{OperationResult, Report};
use crate::resolver::resolve;
use crate::state::{PlanStep, StepState};
use crate::status::{StatusChecker, ToolState, ToolStatus};

/// One entry of a dry-run plan
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub tool: ToolDescriptor,
    pub status: ToolStatus,
}

/// Coordinates registry, resolver, status checks and the driver
pub struct Orchestrator {
    registry: ToolRegistry,
    manager: Arc<dyn PackageManager>,
    checker: StatusChecker,
    platform: Platform,
}

impl Orchestrator {
    pub fn new(registry: ToolRegistry, manager: Arc<dyn PackageManager>, platform: Platform) -> Self {
        let checker = StatusChecker::new(manager.clone(), platform);
        Self {
            registry,
            manager,
            checker,
            platform,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<dyn PackageManager> {
        &self.manager
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Status of every registered tool, in registry order
    pub async fn list(&self) -> Vec<ToolStatus> {
        let mut statuses = Vec::with_capacity(self.registry.len());
        for tool in self.registry.all() {
            statuses.push(self.checker.status(tool).await);
        }
        statuses
    }

    /// Resolved install plan for `tool_id` with current statuses; changes nothing
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTool` or `CoreError::CyclicDependency`
    pub async fn plan(&self, tool_id: &str) -> Result<Vec<PlannedStep>, CoreError> {
        let plan = resolve(&self.registry, tool_id)?;
        let mut steps = Vec::with_capacity(plan.len());
        for tool in plan.steps() {
            steps.push(PlannedStep {
                tool: tool.clone(),
                status: self.checker.status(tool).await,
            });
        }
        Ok(steps)
    }

    /// Install `tool_id` and its dependencies
    ///
    /// After the first failed step every remaining step is skipped. Steps
    /// that already succeeded are left installed.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTool` or `CoreError::CyclicDependency`
    /// before touching the host
    pub async fn install(&self, tool_id: &str) -> Result<Report, CoreError> {
        let plan = resolve(&self.registry, tool_id)?;
        info!(tool = tool_id, plan = ?plan.ids(), "installing");

        let mut report = Report::new(format!("install {tool_id}"));
        let mut failed: Option<&str> = None;

        for tool in plan.steps() {
            let mut step = PlanStep::new(&tool.id);

            if let Some(blocker) = failed {
                step.transition_to(StepState::Skipped)?;
                report.push(OperationResult::skipped(
                    &tool.id,
                    format!("not attempted: {blocker} failed"),
                ));
                continue;
            }

            step.transition_to(StepState::Running)?;
            match self.install_step(tool).await {
                Ok(message) => {
                    step.transition_to(StepState::Succeeded)?;
                    info!(tool = %tool.id, %message, "step succeeded");
                    report.push(OperationResult::success(&tool.id, message));
                }
                Err(e) => {
                    step.transition_to(StepState::Failed)?;
                    error!(tool = %tool.id, error = %e, "step failed");
                    report.push(OperationResult::failed(&tool.id, e.to_string()));
                    failed = Some(tool.id.as_str());
                }
            }
        }

        Ok(report)
    }

    async fn install_step(&self, tool: &ToolDescriptor) -> Result<String, CoreError> {
        let packages = self.packages(tool)?;

        let status = self.checker.status(tool).await;
        if status.is_installed() {
            return Ok(match status.installed_version {
                Some(version) => format!("already installed ({version})"),
                None => "already installed".to_string(),
            });
        }

        let mut reboot_required = false;
        for package in packages {
            let result = self
                .manager
                .install(package)
                .await
                .map_err(|e| CoreError::from_package(&tool.id, e))?;
            reboot_required |= result.reboot_required;
        }

        Ok(with_reboot_note("installed".to_string(), reboot_required))
    }

    /// Upgrade every tool that has an update available
    ///
    /// Each tool is independent: a failure is recorded and the next tool is
    /// still attempted. A tool whose status could not be determined is not
    /// upgraded and is recorded as failed, so the report never claims success
    /// for a run that checked nothing.
    pub async fn update(&self) -> Report {
        let mut report = Report::new("update");

        for tool in self.registry.all() {
            let status = self.checker.status(tool).await;
            match status.state {
                ToolState::UpdateAvailable => {
                    report.push(self.upgrade_step(tool, &status).await);
                }
                ToolState::Unknown => {
                    warn!(tool = %tool.id, "status unknown, not upgrading");
                    report.push(OperationResult::failed(
                        &tool.id,
                        "status unknown: package manager could not be queried",
                    ));
                }
                ToolState::Installed | ToolState::NotInstalled => {}
            }
        }

        info!(attempted = report.results.len(), success = report.is_success(), "update finished");
        report
    }

    /// Upgrade a single tool
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTool` if `tool_id` is not registered
    pub async fn update_tool(&self, tool_id: &str) -> Result<Report, CoreError> {
        let tool = self.registry.lookup(tool_id)?;
        let mut report = Report::new(format!("update {tool_id}"));

        let status = self.checker.status(tool).await;
        let result = match status.state {
            ToolState::NotInstalled => OperationResult::failed(&tool.id, "not installed"),
            ToolState::Installed => OperationResult::success(&tool.id, "already up to date"),
            ToolState::UpdateAvailable | ToolState::Unknown => {
                self.upgrade_step(tool, &status).await
            }
        };
        report.push(result);
        Ok(report)
    }

    async fn upgrade_step(&self, tool: &ToolDescriptor, status: &ToolStatus) -> OperationResult {
        let outcome = async {
            let mut reboot_required = false;
            for package in self.packages(tool)? {
                let result = self
                    .manager
                    .upgrade(package)
                    .await
                    .map_err(|e| CoreError::from_package(&tool.id, e))?;
                reboot_required |= result.reboot_required;
            }
            Ok::<_, CoreError>(reboot_required)
        }
        .await;

        match outcome {
            Ok(reboot_required) => {
                let message = match (&status.installed_version, &status.latest_version) {
                    (Some(from), Some(to)) => format!("upgraded {from} -> {to}"),
                    _ => "upgraded".to_string(),
                };
                info!(tool = %tool.id, %message, "upgrade succeeded");
                OperationResult::success(&tool.id, with_reboot_note(message, reboot_required))
            }
            Err(e) => {
                error!(tool = %tool.id, error = %e, "upgrade failed");
                OperationResult::failed(&tool.id, e.to_string())
            }
        }
    }

    /// Installed tools that have a newer version available
    pub async fn check_updates(&self) -> Vec<ToolStatus> {
        self.list()
            .await
            .into_iter()
            .filter(|s| s.state == ToolState::UpdateAvailable)
            .collect()
    }

    /// Remove `tool_id`
    ///
    /// Refused while another installed tool depends on it. Packages are
    /// removed in reverse declaration order.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTool` if `tool_id` is not registered
    pub async fn uninstall(&self, tool_id: &str) -> Result<Report, CoreError> {
        let tool = self.registry.lookup(tool_id)?;
        let mut report = Report::new(format!("uninstall {tool_id}"));

        let status = self.checker.status(tool).await;
        if status.state == ToolState::NotInstalled {
            report.push(OperationResult::success(&tool.id, "not installed"));
            return Ok(report);
        }

        let mut required_by = Vec::new();
        for dependent in self.registry.dependents(&tool.id) {
            if self.checker.status(dependent).await.is_installed() {
                required_by.push(dependent.id.as_str());
            }
        }
        if !required_by.is_empty() {
            warn!(tool = tool_id, ?required_by, "refusing to uninstall");
            report.push(OperationResult::failed(
                &tool.id,
                format!("required by {}", required_by.join(", ")),
            ));
            return Ok(report);
        }

        let removed = async {
            for package in self.packages(tool)?.iter().rev() {
                self.manager
                    .remove(package)
                    .await
                    .map_err(|e| CoreError::from_package(&tool.id, e))?;
            }
            Ok::<_, CoreError>(())
        }
        .await;

        report.push(match removed {
            Ok(()) => {
                info!(tool = tool_id, "uninstalled");
                OperationResult::success(&tool.id, "removed")
            }
            Err(e) => {
                error!(tool = tool_id, error = %e, "uninstall failed");
                OperationResult::failed(&tool.id, e.to_string())
            }
        });
        Ok(report)
    }

    /// Package ids of `tool` on this platform
    fn packages<'a>(&self, tool: &'a ToolDescriptor) -> Result<&'a [String], CoreError> {
        let packages = tool.packages_for(self.platform);
        if packages.is_empty() {
            return Err(CoreError::PackageOperationFailed {
                tool: tool.id.clone(),
                message: format!("no {} package defined", self.platform),
            });
        }
        Ok(packages)
    }
}

fn with_reboot_note(message: String, reboot_required: bool) -> String {
    if reboot_required {
        format!("{message} (reboot required)")
    } else {
        message
    }
}
