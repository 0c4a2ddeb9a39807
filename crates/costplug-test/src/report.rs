//! Conformance run results.
//!
//! `total`, `passed`, `failed` and `results` are the stable surface callers
//! (a CI job, a CLI) build on; `total == passed + failed == results.len()`.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::config::humantime_serde;
use crate::error::{HarnessError, TestFailure};
use crate::registry::CaseResult;
use crate::tier::CertificationTier;

/// Result of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    success: bool,
    #[serde(serialize_with = "serialize_error")]
    error: Option<TestFailure>,
    details: String,
    #[serde(with = "humantime_serde")]
    duration: Duration,
}

fn serialize_error<S, E>(error: &Option<E>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    E: fmt::Display,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl TestOutcome {
    /// Builds an outcome from a case result and its wall-clock time.
    #[must_use]
    pub fn from_result(result: CaseResult, duration: Duration) -> Self {
        match result {
            Ok(details) => Self {
                success: true,
                error: None,
                details,
                duration,
            },
            Err(error) => Self {
                success: false,
                details: error.to_string(),
                error: Some(error),
                duration,
            },
        }
    }

    /// Returns true if the case passed.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Returns why the case failed.
    #[must_use]
    pub const fn error(&self) -> Option<&TestFailure> {
        self.error.as_ref()
    }

    /// Returns human-readable details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Returns how long the case took.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

/// Aggregate result of a conformance run.
#[derive(Debug, Clone, Serialize)]
pub struct ConformanceReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Tier the run certified against.
    pub tier: CertificationTier,
    /// Number of cases executed.
    pub total: usize,
    /// Number of cases that passed.
    pub passed: usize,
    /// Number of cases that failed.
    pub failed: usize,
    /// Per-case outcomes in execution order.
    pub results: Vec<(String, TestOutcome)>,
    /// Why the harness could not be started. No case ran when set.
    #[serde(
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub setup_error: Option<HarnessError>,
    /// Wall-clock time of the whole run.
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl ConformanceReport {
    pub(crate) fn new(tier: CertificationTier) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tier,
            total: 0,
            passed: 0,
            failed: 0,
            results: Vec::new(),
            setup_error: None,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn aborted(tier: CertificationTier, error: HarnessError) -> Self {
        Self {
            setup_error: Some(error),
            ..Self::new(tier)
        }
    }

    pub(crate) fn record(&mut self, name: impl Into<String>, outcome: TestOutcome) {
        self.total += 1;
        if outcome.success() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push((name.into(), outcome));
    }

    /// Returns true if the harness started and every case passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.setup_error.is_none()
    }

    /// Returns the outcome for `name`.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
    }

    /// Iterates failed cases.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TestOutcome)> {
        self.results
            .iter()
            .filter(|(_, o)| !o.success())
            .map(|(n, o)| (n.as_str(), o))
    }

    /// Returns a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if let Some(error) = &self.setup_error {
            return format!("{} tier: setup failed, no cases executed: {error}", self.tier);
        }
        format!(
            "{} tier: {}/{} passed, {} failed in {}",
            self.tier,
            self.passed,
            self.total,
            self.failed,
            humantime::format_duration(self.elapsed)
        )
    }

    /// Serializes the report as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for (name, outcome) in &self.results {
            let mark = if outcome.success() { "PASS" } else { "FAIL" };
            writeln!(f, "  {mark} {name}: {}", outcome.details())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ConformanceReport {
        let mut report = ConformanceReport::new(CertificationTier::Standard);
        report.record(
            "plugin_name",
            TestOutcome::from_result(Ok("name ok".into()), Duration::from_millis(3)),
        );
        report.record(
            "latency_name",
            TestOutcome::from_result(
                Err(TestFailure::assertion("too slow")),
                Duration::from_millis(7),
            ),
        );
        report
    }

    #[test]
    fn test_counts_agree() {
        let report = report();
        assert_eq!(report.total, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total, report.passed + report.failed);
        assert_eq!(report.total, report.results.len());
        assert!(!report.is_success());
    }

    #[test]
    fn test_failure_outcome_details() {
        let report = report();
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "latency_name");
        assert_eq!(failed[0].1.details(), "assertion failed: too slow");
        assert_eq!(
            failed[0].1.error(),
            Some(&TestFailure::assertion("too slow"))
        );
        assert!(report.outcome("plugin_name").unwrap().success());
    }

    #[test]
    fn test_summary_and_display() {
        let report = report();
        assert!(report.summary().starts_with("standard tier: 1/2 passed, 1 failed"));
        let text = report.to_string();
        assert!(text.contains("PASS plugin_name: name ok"));
        assert!(text.contains("FAIL latency_name"));
    }

    #[test]
    fn test_to_json() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["tier"], "standard");
        assert_eq!(value["results"][1][1]["error"], "assertion failed: too slow");
        assert_eq!(value["results"][0][1]["duration"], "3ms");
    }

    #[test]
    fn test_aborted_report() {
        let report = ConformanceReport::aborted(CertificationTier::Basic, HarnessError::Stopped);
        assert_eq!(report.total, 0);
        assert!(report.results.is_empty());
        assert!(!report.is_success());
        assert!(report.summary().contains("setup failed"));
        assert!(report.to_string().contains("no cases executed"));

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value["setup_error"],
            "harness is stopped and cannot be restarted"
        );
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = ConformanceReport::new(CertificationTier::Basic);
        assert!(report.is_success());
        assert_eq!(report.total, 0);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("setup_error").is_none());
    }
}
