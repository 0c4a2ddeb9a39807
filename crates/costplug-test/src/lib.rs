// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # costplug-test
//!
//! Conformance and performance validation for cost-source plugins.
//!
//! This crate provides:
//! - **Harness**: runs a plugin in-process behind the in-memory transport
//! - **Mock**: a cost source with per-method error, delay and response injection
//! - **Registry**: tiered test cases, selected by certification tier
//! - **Runner**: executes selected cases, isolating failures and panics
//! - **Latency**: sequential timing compared against per-method baselines
//!
//! ## Example
//!
//! ```rust,ignore
//! use costplug_test::{CertificationTier, ConformanceRunner, Harness};
//!
//! let mut harness = Harness::new(MyPlugin::default());
//! let report = ConformanceRunner::global()
//!     .run(CertificationTier::Standard, &mut harness)
//!     .await;
//! assert!(report.is_success(), "{report}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod baseline;
pub mod config;
pub mod context;
pub mod error;
pub mod harness;
pub mod latency;
pub mod mock;
pub mod registry;
pub mod report;
pub mod runner;
pub mod suites;
pub mod tier;

pub use baseline::{BaselineTable, DEFAULT_BASELINES, PerformanceBaseline};
pub use config::ConformanceConfig;
pub use context::{CallResultExt, TestContext};
pub use error::{HarnessError, Result, TestError, TestFailure};
pub use harness::{Harness, HarnessState};
pub use latency::{DEFAULT_ITERATIONS, LatencyMeasurement, LatencyMeasurer, LatencyRun};
pub use mock::{MockCostSource, MockSnapshot};
pub use registry::{CaseResult, Category, Registry, RegistryBuilder, TestCase, TestFn};
pub use report::{ConformanceReport, TestOutcome};
pub use runner::ConformanceRunner;
pub use tier::{CertificationTier, UnknownTier};
