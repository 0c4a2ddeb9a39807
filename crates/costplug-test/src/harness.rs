//! In-process plugin harness.
//!
//! Binds a [`CostSource`] to the in-memory transport and holds a connected
//! client. Lifecycle is forward-only:
//!
//! ```text
//! Created ──start()──▶ Started ──stop()──▶ Stopped
//!    └──────────────stop()──────────────────▲
//! ```
//!
//! A failed `start()` also lands in `Stopped`. Every task the transport
//! spawned is reclaimed by `stop()`; dropping a started harness aborts them.

use std::fmt;
use std::sync::Arc;

use costplug_core::{
    Capability, CapabilitySet, CostSource, CostSourceClient, DEFAULT_BUFFER, InMemoryTransport,
    ServerHandle,
};

use crate::error::HarnessError;
use crate::mock::{MockCostSource, MockSnapshot};

/// Harness lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarnessState {
    /// Constructed, transport not yet bound.
    Created,
    /// Transport bound, client available.
    Started,
    /// Torn down. Terminal.
    Stopped,
}

impl fmt::Display for HarnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Runs a plugin in-process behind the in-memory transport.
pub struct Harness {
    service: Arc<dyn CostSource>,
    mock: Option<MockCostSource>,
    capabilities: CapabilitySet,
    transport: InMemoryTransport,
    state: HarnessState,
    server: Option<ServerHandle>,
    client: Option<CostSourceClient>,
}

impl Harness {
    /// Creates a harness for `service`.
    #[must_use]
    pub fn new(service: impl CostSource) -> Self {
        Self::from_arc(Arc::new(service))
    }

    /// Creates a harness for a shared service.
    #[must_use]
    pub fn from_arc(service: Arc<dyn CostSource>) -> Self {
        let capabilities = service.capabilities();
        Self {
            service,
            mock: None,
            capabilities,
            transport: InMemoryTransport::new(DEFAULT_BUFFER),
            state: HarnessState::Created,
            server: None,
            client: None,
        }
    }

    /// Creates a harness around a mock. `mock()` returns a handle sharing
    /// its state; the runner restores it before each case.
    #[must_use]
    pub fn mocked(mock: MockCostSource) -> Self {
        let mut harness = Self::from_arc(Arc::new(mock.clone()));
        harness.mock = Some(mock);
        harness
    }

    /// Sets the transport channel capacity.
    #[must_use]
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        let gauge = self.transport.gauge().clone();
        self.transport = InMemoryTransport::new(buffer).with_gauge(gauge);
        self
    }

    /// Binds the service and connects a client.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the harness was already started or stopped, or
    /// if the transport cannot be established. A transport failure leaves
    /// the harness stopped.
    pub fn start(&mut self) -> Result<(), HarnessError> {
        match self.state {
            HarnessState::Started => return Err(HarnessError::AlreadyStarted),
            HarnessState::Stopped => return Err(HarnessError::Stopped),
            HarnessState::Created => {}
        }

        match self.transport.bind(Arc::clone(&self.service)) {
            Ok((server, client)) => {
                self.server = Some(server);
                self.client = Some(client);
                self.state = HarnessState::Started;
                tracing::info!(capabilities = ?self.capabilities, "harness started");
                Ok(())
            }
            Err(e) => {
                self.state = HarnessState::Stopped;
                tracing::warn!(error = %e, "harness failed to start");
                Err(e.into())
            }
        }
    }

    /// Tears down the server and releases the client. Idempotent.
    ///
    /// Returns once every transport task has exited.
    pub async fn stop(&mut self) {
        self.client = None;
        if let Some(server) = self.server.take() {
            server.shutdown().await;
            tracing::info!("harness stopped");
        }
        self.state = HarnessState::Stopped;
    }

    /// Returns a connected client.
    ///
    /// # Errors
    /// Returns [`HarnessError::NotStarted`] before a successful `start()`,
    /// and [`HarnessError::Stopped`] after `stop()`.
    pub fn client(&self) -> Result<CostSourceClient, HarnessError> {
        match (&self.state, &self.client) {
            (HarnessState::Started, Some(client)) => Ok(client.clone()),
            (HarnessState::Stopped, _) => Err(HarnessError::Stopped),
            _ => Err(HarnessError::NotStarted),
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> HarnessState {
        self.state
    }

    /// Returns the capabilities the service declared at construction.
    #[must_use]
    pub const fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Returns true if the service declared `cap`.
    #[must_use]
    pub const fn supports(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns the wrapped mock, if this harness was built with one.
    #[must_use]
    pub const fn mock(&self) -> Option<&MockCostSource> {
        self.mock.as_ref()
    }

    /// Captures the mock's overrides. `None` for a real service.
    #[must_use]
    pub fn mock_snapshot(&self) -> Option<MockSnapshot> {
        self.mock.as_ref().map(MockCostSource::snapshot)
    }

    /// Puts the mock back to `snapshot` with zeroed counters. No-op for a
    /// real service.
    pub fn restore_mock(&self, snapshot: &MockSnapshot) {
        if let Some(mock) = &self.mock {
            mock.restore(snapshot);
        }
    }

    /// Returns the number of live transport tasks.
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.transport.gauge().active()
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .field("mocked", &self.mock.is_some())
            .field("active_workers", &self.active_workers())
            .finish_non_exhaustive()
    }
}
