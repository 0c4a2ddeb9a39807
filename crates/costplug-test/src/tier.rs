//! Certification tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A certification level gating which cases a plugin must pass.
///
/// Ordering is total: `Basic < Standard < Advanced`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CertificationTier {
    /// Functional correctness only.
    #[default]
    Basic,
    /// Adds consistency, latency and basic concurrency.
    Standard,
    /// Adds stricter latency and heavier concurrency.
    Advanced,
}

impl CertificationTier {
    /// Every tier, lowest first.
    pub const ALL: [Self; 3] = [Self::Basic, Self::Standard, Self::Advanced];

    /// Returns the tier name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Advanced => "advanced",
        }
    }

    /// Returns true if a case with minimum tier `min` is eligible at this tier.
    #[must_use]
    pub fn admits(self, min: Self) -> bool {
        self >= min
    }
}

impl fmt::Display for CertificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown certification tier: {0} (expected basic, standard or advanced)")]
pub struct UnknownTier(pub String);

impl FromStr for CertificationTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}
