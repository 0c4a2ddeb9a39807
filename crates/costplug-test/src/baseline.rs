//! Per-method latency baselines.
//!
//! Basic certification carries no latency gate; Standard and Advanced
//! compare the measured average against the method's threshold.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use costplug_core::Method;

use crate::config::humantime_serde;
use crate::tier::CertificationTier;

/// Latency thresholds for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceBaseline {
    /// The method the thresholds apply to.
    pub method: Method,
    /// Maximum average latency for Standard certification.
    #[serde(with = "humantime_serde")]
    pub standard: Duration,
    /// Maximum average latency for Advanced certification.
    #[serde(with = "humantime_serde")]
    pub advanced: Duration,
}

impl PerformanceBaseline {
    /// Creates a baseline.
    #[must_use]
    pub const fn new(method: Method, standard: Duration, advanced: Duration) -> Self {
        Self {
            method,
            standard,
            advanced,
        }
    }

    /// Returns the threshold for `tier`, or `None` when the tier has no
    /// latency gate.
    #[must_use]
    pub const fn threshold(&self, tier: CertificationTier) -> Option<Duration> {
        match tier {
            CertificationTier::Basic => None,
            CertificationTier::Standard => Some(self.standard),
            CertificationTier::Advanced => Some(self.advanced),
        }
    }
}

const fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Default thresholds, one per contract method.
pub const DEFAULT_BASELINES: [PerformanceBaseline; 7] = [
    PerformanceBaseline::new(Method::Name, ms(100), ms(50)),
    PerformanceBaseline::new(Method::Supports, ms(50), ms(25)),
    PerformanceBaseline::new(Method::GetActualCost, ms(2000), ms(1000)),
    PerformanceBaseline::new(Method::GetProjectedCost, ms(200), ms(100)),
    PerformanceBaseline::new(Method::GetPricingSpec, ms(200), ms(100)),
    PerformanceBaseline::new(Method::EstimateCost, ms(500), ms(250)),
    PerformanceBaseline::new(Method::GetRecommendations, ms(500), ms(250)),
];

/// Lookup table of baselines keyed by method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineTable {
    entries: BTreeMap<Method, PerformanceBaseline>,
}

impl BaselineTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns a copy with `baseline` replacing any entry for its method.
    #[must_use]
    pub fn with_override(mut self, baseline: PerformanceBaseline) -> Self {
        self.entries.insert(baseline.method, baseline);
        self
    }

    /// Returns the baseline for `method`.
    #[must_use]
    pub fn get(&self, method: Method) -> Option<&PerformanceBaseline> {
        self.entries.get(&method)
    }

    /// Returns the threshold for `method` at `tier`.
    #[must_use]
    pub fn threshold(&self, method: Method, tier: CertificationTier) -> Option<Duration> {
        self.get(method).and_then(|b| b.threshold(tier))
    }

    /// Iterates baselines in method order.
    pub fn iter(&self) -> impl Iterator<Item = &PerformanceBaseline> {
        self.entries.values()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BaselineTable {
    fn default() -> Self {
        DEFAULT_BASELINES
            .into_iter()
            .fold(Self::empty(), Self::with_override)
    }
}
