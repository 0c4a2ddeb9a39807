//! costplug: conformance and performance certification for cost-source
//! plugins.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use costplug::prelude::*;
//!
//! # async fn certify() {
//! let mut harness = Harness::mocked(MockCostSource::default());
//! let report = ConformanceRunner::global()
//!     .run(CertificationTier::Standard, &mut harness)
//!     .await;
//! println!("{report}");
//! # }
//! ```

pub use costplug_core as core;
pub use costplug_test as test;

/// Prelude module for common imports.
pub mod prelude {
    pub use costplug_core::{
        Capability, CapabilitySet, ContractError, CostSource, CostSourceClient, Method, Request,
        ResourceDescriptor, Response,
    };
    pub use costplug_test::{
        CertificationTier, ConformanceConfig, ConformanceReport, ConformanceRunner, Harness,
        MockCostSource, Registry, RegistryBuilder, TestCase, TestContext, TestFailure,
    };
}
