//! What a test case sees while it runs.

use costplug_core::{Capability, ContractError, CostSourceClient, Method};

use crate::baseline::BaselineTable;
use crate::config::ConformanceConfig;
use crate::error::TestFailure;
use crate::harness::Harness;
use crate::latency::LatencyMeasurer;
use crate::mock::MockCostSource;
use crate::tier::CertificationTier;

/// Borrowed view of the harness and run settings handed to each case.
#[derive(Debug, Clone, Copy)]
pub struct TestContext<'a> {
    harness: &'a Harness,
    tier: CertificationTier,
    config: &'a ConformanceConfig,
    baselines: &'a BaselineTable,
}

impl<'a> TestContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(
        harness: &'a Harness,
        tier: CertificationTier,
        config: &'a ConformanceConfig,
        baselines: &'a BaselineTable,
    ) -> Self {
        Self {
            harness,
            tier,
            config,
            baselines,
        }
    }

    /// Returns a client with the configured call deadline applied.
    ///
    /// # Errors
    /// Returns [`TestFailure::Harness`] if the harness is not running.
    pub fn client(&self) -> Result<CostSourceClient, TestFailure> {
        let client = self.harness.client()?;
        Ok(match self.config.call_timeout {
            Some(deadline) => client.with_deadline(deadline),
            None => client,
        })
    }

    /// Returns the harness.
    #[must_use]
    pub const fn harness(&self) -> &'a Harness {
        self.harness
    }

    /// Returns the tier being certified.
    #[must_use]
    pub const fn tier(&self) -> CertificationTier {
        self.tier
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &'a ConformanceConfig {
        self.config
    }

    /// Returns the effective latency baselines.
    #[must_use]
    pub const fn baselines(&self) -> &'a BaselineTable {
        self.baselines
    }

    /// Returns true if the plugin declared `cap`.
    #[must_use]
    pub const fn supports(&self, cap: Capability) -> bool {
        self.harness.supports(cap)
    }

    /// Returns the wrapped mock, if any.
    #[must_use]
    pub const fn mock(&self) -> Option<&'a MockCostSource> {
        self.harness.mock()
    }

    /// Returns a measurer using the configured iteration count.
    #[must_use]
    pub fn measurer(&self) -> LatencyMeasurer {
        LatencyMeasurer::new(self.config.iterations)
    }
}

/// Attributes a contract error to the method that produced it.
pub trait CallResultExt<T> {
    /// Maps `Err(e)` to [`TestFailure::Call`] for `method`.
    ///
    /// # Errors
    /// Returns the mapped failure.
    fn during(self, method: Method) -> Result<T, TestFailure>;
}

impl<T> CallResultExt<T> for Result<T, ContractError> {
    fn during(self, method: Method) -> Result<T, TestFailure> {
        self.map_err(|e| TestFailure::call(method, e))
    }
}
