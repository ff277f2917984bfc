//! Operation results and command reports

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final outcome of one plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
            Outcome::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub tool_id: String,
    pub outcome: Outcome,
    pub message: String,
}

impl OperationResult {
    pub fn success(tool_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(tool_id, Outcome::Success, message)
    }

    pub fn failed(tool_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(tool_id, Outcome::Failed, message)
    }

    pub fn skipped(tool_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(tool_id, Outcome::Skipped, message)
    }

    fn new(tool_id: impl Into<String>, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            outcome,
            message: message.into(),
        }
    }
}

/// Aggregated results of one command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Command that produced this report, e.g. `install xyce`
    pub command: String,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<OperationResult>,
}

impl Report {
    /// Start an empty report
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            generated_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: OperationResult) {
        self.results.push(result);
    }

    /// True when every step succeeded; an empty report counts as success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome == Outcome::Success)
    }

    /// Results that did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| r.outcome != Outcome::Success)
    }

    /// Outcome of each step, in order
    #[must_use]
    pub fn outcomes(&self) -> Vec<(&str, Outcome)> {
        self.results
            .iter()
            .map(|r| (r.tool_id.as_str(), r.outcome))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_success() {
        assert!(Report::new("update").is_success());
    }

    #[test]
    fn test_skipped_step_fails_report() {
        let mut report = Report::new("install xyce");
        report.push(OperationResult::success("ngspice", "installed"));
        report.push(OperationResult::skipped("xyce", "ngspice failed"));

        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.outcomes(),
            vec![("ngspice", Outcome::Success), ("xyce", Outcome::Skipped)]
        );
    }

    #[test]
    fn test_json_shape() {
        let mut report = Report::new("install kicad");
        report.push(OperationResult::failed("kicad", "lock held"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["command"], "install kicad");
        assert_eq!(json["results"][0]["outcome"], "failed");
        assert!(json["generated_at"].is_string());
    }
}
