//! Conformance framework integration tests.

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::default_trait_access)]

mod harness;
mod latency;
mod mock;
mod registry;
mod runner;
