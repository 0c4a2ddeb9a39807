//! Conformance error types.
//!
//! Three layers, matching how far a failure is allowed to travel:
//! - [`HarnessError`]: setup failures, fatal to a whole run and carried in
//!   the report
//! - [`TestFailure`]: why a single case failed, recorded in its outcome
//! - [`TestError`]: everything that escapes the crate's public API

use std::time::Duration;

use costplug_core::{ContractError, Method, TransportError};

use crate::tier::CertificationTier;

/// Result type alias for conformance operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Harness lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    /// `start()` was called on a harness that is already running.
    #[error("harness already started")]
    AlreadyStarted,

    /// `start()` was called after `stop()`, or after a failed start.
    #[error("harness is stopped and cannot be restarted")]
    Stopped,

    /// `client()` was called before a successful `start()`.
    #[error("harness not started")]
    NotStarted,

    /// The in-memory transport could not be established.
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

/// Why a single test case failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestFailure {
    /// A contract call returned an error the case did not expect.
    #[error("{method} call failed: {error}")]
    Call {
        /// The method called.
        method: Method,
        /// The error it returned.
        error: ContractError,
    },

    /// Average latency exceeded the tier's baseline.
    #[error("{method} average latency {observed:?} exceeds {tier} threshold {threshold:?}")]
    Latency {
        /// The method measured.
        method: Method,
        /// Observed average.
        observed: Duration,
        /// Baseline threshold for the tier.
        threshold: Duration,
        /// Tier the threshold belongs to.
        tier: CertificationTier,
    },

    /// A check inside the case did not hold.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The case panicked.
    #[error("test panicked: {0}")]
    Panic(String),

    /// The case could not reach the plugin through the harness.
    #[error("harness error: {0}")]
    Harness(#[from] HarnessError),
}

impl TestFailure {
    /// Creates a call failure.
    #[must_use]
    pub const fn call(method: Method, error: ContractError) -> Self {
        Self::Call { method, error }
    }

    /// Creates an assertion failure.
    #[must_use]
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }

    /// Returns true if this is a latency-threshold violation.
    #[must_use]
    pub const fn is_latency(&self) -> bool {
        matches!(self, Self::Latency { .. })
    }
}

/// Errors surfaced by the conformance API.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid registration.
    #[error("registry error: {0}")]
    Registry(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a registry error.
    #[must_use]
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }
}
