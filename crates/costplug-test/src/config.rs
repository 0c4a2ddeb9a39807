//! Conformance run configuration.
//!
//! Configuration is validated at load time, with sensible defaults and
//! clear error messages. Durations are written the humantime way
//! (`"150ms"`, `"2s"`).
//!
//! ```toml
//! tier = "standard"
//! iterations = 20
//! call_timeout = "5s"
//!
//! [[baselines]]
//! method = "GetProjectedCost"
//! standard = "150ms"
//! advanced = "75ms"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use costplug_core::DEFAULT_BUFFER;

use crate::baseline::{BaselineTable, PerformanceBaseline};
use crate::error::{Result, TestError};
use crate::latency::DEFAULT_ITERATIONS;
use crate::tier::CertificationTier;

/// Settings for one conformance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceConfig {
    /// Tier to certify against when the caller does not pick one.
    #[serde(default)]
    pub tier: CertificationTier,

    /// Repetitions per latency measurement.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Deadline applied to every call a case makes.
    #[serde(default, with = "humantime_serde::option")]
    pub call_timeout: Option<Duration>,

    /// Parallel callers in concurrency cases.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// In-memory transport channel capacity.
    #[serde(default = "default_transport_buffer")]
    pub transport_buffer: usize,

    /// Per-method latency overrides, layered over the defaults.
    #[serde(default)]
    pub baselines: Vec<PerformanceBaseline>,
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_concurrency() -> u32 {
    10
}

fn default_transport_buffer() -> usize {
    DEFAULT_BUFFER
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            tier: CertificationTier::default(),
            iterations: default_iterations(),
            call_timeout: None,
            concurrency: default_concurrency(),
            transport_buffer: default_transport_buffer(),
            baselines: Vec::new(),
        }
    }
}

impl ConformanceConfig {
    /// Creates a default configuration for `tier`.
    #[must_use]
    pub fn for_tier(tier: CertificationTier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading conformance config");
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or validated.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TestError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(TestError::config("iterations must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(TestError::config("concurrency must be at least 1"));
        }
        if self.transport_buffer == 0 {
            return Err(TestError::config("transport_buffer must be at least 1"));
        }
        if self.call_timeout.is_some_and(|t| t.is_zero()) {
            return Err(TestError::config("call_timeout must be greater than zero"));
        }

        let mut seen = HashSet::new();
        for baseline in &self.baselines {
            if !seen.insert(baseline.method) {
                return Err(TestError::config(format!(
                    "duplicate baseline for {}",
                    baseline.method
                )));
            }
            if baseline.advanced > baseline.standard {
                return Err(TestError::config(format!(
                    "{}: advanced threshold {:?} is looser than standard {:?}",
                    baseline.method, baseline.advanced, baseline.standard
                )));
            }
        }

        Ok(())
    }

    /// Returns the default baseline table with this config's overrides
    /// applied.
    #[must_use]
    pub fn baseline_table(&self) -> BaselineTable {
        self.baselines
            .iter()
            .fold(BaselineTable::default(), |table, b| table.with_override(*b))
    }
}

/// Serde helper for humantime durations.
pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration as a human-readable string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserializes a duration from a human-readable string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Same, for optional durations.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        /// Serializes an optional duration.
        ///
        /// # Errors
        /// Returns an error if serialization fails.
        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional duration.
        ///
        /// # Errors
        /// Returns an error if the string cannot be parsed.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
