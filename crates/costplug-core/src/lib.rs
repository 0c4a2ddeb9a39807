// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # costplug-core
//!
//! The cost-source plugin contract and the in-memory transport used to
//! exercise it without sockets.
//!
//! - [`CostSource`] trait every plugin implements
//! - [`Method`] and [`Capability`] enumerations naming the contract surface
//! - [`ContractError`] for per-call failures
//! - [`InMemoryTransport`] binding a plugin to a [`CostSourceClient`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use costplug_core::InMemoryTransport;
//!
//! let transport = InMemoryTransport::default();
//! let (server, client) = transport.bind(Arc::new(MyPlugin))?;
//! let name = client.name().await?;
//! server.shutdown().await;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod service;
pub mod transport;
pub mod types;

pub use error::{ContractError, Result, TransportError};
pub use service::{CostSource, dispatch};
pub use transport::{
    CostSourceClient, DEFAULT_BUFFER, InMemoryTransport, ServerHandle, WorkerGauge,
};
pub use types::{
    ActualCostRequest, ActualCostResponse, Capability, CapabilitySet, CostRecord,
    EstimateCostRequest, EstimateCostResponse, Method, NameResponse, PricingSpec,
    PricingSpecRequest, PricingSpecResponse, ProjectedCostRequest, ProjectedCostResponse,
    Recommendation, RecommendationsRequest, RecommendationsResponse, Request, ResourceDescriptor,
    Response, SupportsRequest, SupportsResponse, UnknownMethod,
};
