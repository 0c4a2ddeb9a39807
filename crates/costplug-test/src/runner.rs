//! Conformance runner.
//!
//! Selects the cases eligible for a tier and runs them one at a time
//! against a harness. A failing or panicking case is recorded and the run
//! moves on; only a harness that cannot be started aborts the run, and the
//! report then carries the setup error instead of outcomes.
//!
//! A mocked harness is put back to the overrides it had when the run began
//! before every case, so one case's injections never leak into the next.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;

use crate::baseline::BaselineTable;
use crate::config::ConformanceConfig;
use crate::context::TestContext;
use crate::error::{HarnessError, Result, TestFailure};
use crate::harness::{Harness, HarnessState};
use crate::registry::{CaseResult, Registry, TestCase};
use crate::report::{ConformanceReport, TestOutcome};
use crate::tier::CertificationTier;

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs registered cases against a harness.
#[derive(Debug, Clone)]
pub struct ConformanceRunner<'r> {
    registry: &'r Registry,
    config: ConformanceConfig,
    baselines: BaselineTable,
}

impl ConformanceRunner<'static> {
    /// Creates a runner over the built-in suite with default settings.
    #[must_use]
    pub fn global() -> Self {
        Self::new(Registry::global())
    }
}

impl<'r> ConformanceRunner<'r> {
    /// Creates a runner over `registry` with default settings.
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        let config = ConformanceConfig::default();
        let baselines = config.baseline_table();
        Self {
            registry,
            config,
            baselines,
        }
    }

    /// Creates a runner with explicit settings.
    ///
    /// # Errors
    /// Returns an error if `config` fails validation.
    pub fn with_config(registry: &'r Registry, config: ConformanceConfig) -> Result<Self> {
        config.validate()?;
        let baselines = config.baseline_table();
        Ok(Self {
            registry,
            config,
            baselines,
        })
    }

    /// Returns the run settings.
    #[must_use]
    pub const fn config(&self) -> &ConformanceConfig {
        &self.config
    }

    /// Runs every case eligible at the configured tier.
    pub async fn run_configured(&self, harness: &mut Harness) -> ConformanceReport {
        self.run(self.config.tier, harness).await
    }

    /// Runs every case eligible at `tier`, in registration order.
    ///
    /// A harness still in `Created` is started here and stopped afterwards;
    /// a running harness is used as-is and left running. If the harness is
    /// stopped or cannot be started, no case runs and the report's
    /// `setup_error` says why.
    pub async fn run(&self, tier: CertificationTier, harness: &mut Harness) -> ConformanceReport {
        let started_here = match harness.state() {
            HarnessState::Created => match harness.start() {
                Ok(()) => true,
                Err(e) => return Self::aborted(tier, e),
            },
            HarnessState::Started => false,
            HarnessState::Stopped => return Self::aborted(tier, HarnessError::Stopped),
        };
        let baseline = harness.mock_snapshot().unwrap_or_default();

        let cases = self.registry.select(tier);
        tracing::info!(%tier, cases = cases.len(), "conformance run starting");

        let run_start = Instant::now();
        let mut report = ConformanceReport::new(tier);
        for case in cases {
            harness.restore_mock(&baseline);
            let outcome = self.run_case(case, tier, harness).await;
            report.record(case.name(), outcome);
        }
        report.elapsed = run_start.elapsed();

        if started_here {
            harness.stop().await;
        } else {
            harness.restore_mock(&baseline);
        }

        tracing::info!(
            run_id = %report.run_id,
            passed = report.passed,
            failed = report.failed,
            "conformance run finished"
        );
        report
    }

    fn aborted(tier: CertificationTier, error: HarnessError) -> ConformanceReport {
        tracing::error!(%tier, %error, "conformance run aborted: harness setup failed");
        ConformanceReport::aborted(tier, error)
    }

    async fn run_case(
        &self,
        case: &TestCase,
        tier: CertificationTier,
        harness: &Harness,
    ) -> TestOutcome {
        let ctx = TestContext::new(harness, tier, &self.config, &self.baselines);

        let start = Instant::now();
        let result: CaseResult = match AssertUnwindSafe(async { case.run(&ctx).await })
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(TestFailure::Panic(panic_payload_to_string(
                payload.as_ref(),
            ))),
        };
        let outcome = TestOutcome::from_result(result, start.elapsed());

        if outcome.success() {
            tracing::info!(
                case = case.name(),
                duration = ?outcome.duration(),
                "case passed"
            );
        } else {
            tracing::warn!(
                case = case.name(),
                duration = ?outcome.duration(),
                reason = outcome.details(),
                "case failed"
            );
        }
        outcome
    }
}
