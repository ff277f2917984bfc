//! Plan step state machine

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// Lifecycle of one plan step
///
/// `Pending -> Running -> {Succeeded | Failed}`, or `Pending -> Skipped`
/// when an earlier step of the same plan failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StepState {
    /// Check whether moving to `next` is allowed
    #[must_use]
    pub fn can_transition_to(self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Pending, StepState::Running)
                | (StepState::Pending, StepState::Skipped)
                | (StepState::Running, StepState::Succeeded)
                | (StepState::Running, StepState::Failed)
        )
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepState::Succeeded | StepState::Failed | StepState::Skipped
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::Pending => "pending",
            StepState::Running => "running",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
            StepState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// One tool's progress through a plan
#[derive(Debug, Clone)]
pub struct PlanStep {
    tool_id: String,
    state: StepState,
}

impl PlanStep {
    /// Create a pending step
    pub fn new(tool_id: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            state: StepState::Pending,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> StepState {
        self.state
    }

    /// Transition to a new state with validation
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTransition` for transitions the state
    /// machine does not allow.
    pub fn transition_to(&mut self, next: StepState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(tool = %self.tool_id, from = %self.state, to = %next, "step transition");
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut step = PlanStep::new("ngspice");
        step.transition_to(StepState::Running).unwrap();
        step.transition_to(StepState::Succeeded).unwrap();
        assert!(step.state().is_terminal());
    }

    #[test]
    fn test_skip_only_from_pending() {
        let mut step = PlanStep::new("xyce");
        step.transition_to(StepState::Skipped).unwrap();

        let mut running = PlanStep::new("kicad");
        running.transition_to(StepState::Running).unwrap();
        let err = running.transition_to(StepState::Skipped).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: StepState::Running,
                to: StepState::Skipped
            }
        ));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [StepState::Succeeded, StepState::Failed, StepState::Skipped] {
            for next in [
                StepState::Pending,
                StepState::Running,
                StepState::Succeeded,
                StepState::Failed,
                StepState::Skipped,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
