//! Scenario and suite results.

use crate::result::{FlakeError, FlakeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Every step succeeded
    Passed,
    /// A step failed and the scenario stopped there
    Failed,
}

impl ScenarioStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// One completed or failed scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name, e.g. `fill #email`
    pub name: String,
    /// Time spent in the step
    pub elapsed_ms: u64,
    /// Whether the step succeeded
    pub passed: bool,
}

/// Result of running one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario title
    pub name: String,
    /// Scenario tag, e.g. `@c1`
    pub tag: String,
    /// Outcome
    pub status: ScenarioStatus,
    /// Wall time including page setup and teardown
    pub duration_ms: u64,
    /// Steps in execution order; a failed scenario ends with its failing step
    pub steps: Vec<StepRecord>,
    /// Failing step name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioReport {
    /// Create a passing report
    #[must_use]
    pub fn passed(
        name: impl Into<String>,
        tag: impl Into<String>,
        steps: Vec<StepRecord>,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            status: ScenarioStatus::Passed,
            duration_ms: crate::wait::duration_ms(duration),
            steps,
            failed_step: None,
            error: None,
        }
    }

    /// Create a failing report from the error that stopped the scenario
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        tag: impl Into<String>,
        steps: Vec<StepRecord>,
        duration: Duration,
        error: &FlakeError,
    ) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            status: ScenarioStatus::Failed,
            duration_ms: crate::wait::duration_ms(duration),
            steps,
            failed_step: error.failed_step().map(str::to_string),
            error: Some(error.to_string()),
        }
    }

    /// Check if the scenario passed
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        self.status.is_passed()
    }
}

/// Results of a suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Application URL the run targeted
    pub base_url: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Scenario results in declaration order
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Create an empty report for a run starting now
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            base_url: base_url.into(),
            started_at: now,
            finished_at: now,
            scenarios: Vec::new(),
        }
    }

    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::is_passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.is_passed()).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.is_passed()).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    /// Get failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.is_passed()).collect()
    }

    /// Wall time of the run
    #[must_use]
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> FlakeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON report
    pub fn from_json(raw: &str) -> FlakeResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} total in {:.2}s",
            self.passed_count(),
            self.failed_count(),
            self.total(),
            self.duration().as_secs_f64()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn step(name: &str, passed: bool) -> StepRecord {
        StepRecord {
            name: name.to_string(),
            elapsed_ms: 12,
            passed,
        }
    }

    fn failing_error() -> FlakeError {
        FlakeError::StepFailed {
            step: "click #submitButton".to_string(),
            elapsed_ms: 40,
            source: Box::new(FlakeError::Timeout {
                waited_for: "#submitButton to be visible".to_string(),
                timeout_ms: 40,
                elapsed_ms: 40,
            }),
        }
    }

    mod scenario_report_tests {
        use super::*;

        #[test]
        fn test_failed_report_names_step() {
            let report = ScenarioReport::failed(
                "Login and logout",
                "@c4",
                vec![step("goto /", true), step("click #submitButton", false)],
                Duration::from_millis(90),
                &failing_error(),
            );
            assert!(!report.is_passed());
            assert_eq!(report.failed_step.as_deref(), Some("click #submitButton"));
            assert!(report
                .error
                .as_deref()
                .unwrap()
                .contains("#submitButton to be visible"));
            assert_eq!(report.duration_ms, 90);
        }

        #[test]
        fn test_passed_report() {
            let report = ScenarioReport::passed("x", "@c1", vec![step("a", true)], Duration::ZERO);
            assert!(report.is_passed());
            assert!(report.error.is_none());
        }
    }

    mod suite_report_tests {
        use super::*;

        fn mixed() -> SuiteReport {
            let mut suite = SuiteReport::new("http://localhost:3000");
            suite
                .scenarios
                .push(ScenarioReport::passed("a", "@c1", vec![], Duration::ZERO));
            suite.scenarios.push(ScenarioReport::failed(
                "b",
                "@c2",
                vec![],
                Duration::ZERO,
                &failing_error(),
            ));
            suite
        }

        #[test]
        fn test_counts() {
            let suite = mixed();
            assert!(!suite.all_passed());
            assert_eq!(suite.passed_count(), 1);
            assert_eq!(suite.failed_count(), 1);
            assert_eq!(suite.total(), 2);
            assert_eq!(suite.failures()[0].tag, "@c2");
        }

        #[test]
        fn test_empty_suite_passes() {
            assert!(SuiteReport::new("http://localhost:3000").all_passed());
        }

        #[test]
        fn test_json_shape() {
            let suite = mixed();
            let json = suite.to_json().unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["scenarios"][0]["status"], "passed");
            assert_eq!(value["scenarios"][1]["failed_step"], "click #submitButton");
            assert!(value["scenarios"][0].get("error").is_none());
            assert_eq!(SuiteReport::from_json(&json).unwrap(), suite);
        }

        #[test]
        fn test_display_summary() {
            let summary = mixed().to_string();
            assert!(summary.starts_with("1 passed, 1 failed, 2 total"));
        }
    }
}
