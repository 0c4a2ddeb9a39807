//! In-memory transport between a cost-source server and its clients.
//!
//! Calls travel over a bounded channel as envelopes carrying a typed
//! request and a oneshot reply. The server dispatches each call on its own
//! task, the way an RPC server would, so concurrent callers really do run
//! concurrently against the plugin.
//!
//! Every task the server spawns is counted by a [`WorkerGauge`]; after
//! [`ServerHandle::shutdown`] returns the gauge reads zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{ContractError, Result, TransportError};
use crate::service::{CostSource, dispatch};
use crate::types::{
    ActualCostRequest, ActualCostResponse, EstimateCostRequest, EstimateCostResponse, Method,
    NameResponse, PricingSpecRequest, PricingSpecResponse, ProjectedCostRequest,
    ProjectedCostResponse, RecommendationsRequest, RecommendationsResponse, Request, Response,
    SupportsRequest, SupportsResponse,
};

/// Default channel capacity.
pub const DEFAULT_BUFFER: usize = 64;

/// Counts live server tasks (accept loop plus in-flight dispatches).
#[derive(Debug, Clone, Default)]
pub struct WorkerGauge(Arc<AtomicUsize>);

impl WorkerGauge {
    /// Creates a gauge reading zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live workers.
    #[must_use]
    pub fn active(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> WorkerGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        WorkerGuard(Arc::clone(&self.0))
    }
}

/// Decrements the gauge when the owning task finishes or is aborted.
struct WorkerGuard(Arc<AtomicUsize>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A call in flight.
#[derive(Debug)]
struct Envelope {
    request: Request,
    reply: oneshot::Sender<Result<Response>>,
}

/// Builds server/client pairs over in-memory channels.
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    buffer: usize,
    gauge: WorkerGauge,
}

impl InMemoryTransport {
    /// Creates a transport with the given channel capacity.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer,
            gauge: WorkerGauge::new(),
        }
    }

    /// Uses an existing gauge instead of a fresh one.
    #[must_use]
    pub fn with_gauge(mut self, gauge: WorkerGauge) -> Self {
        self.gauge = gauge;
        self
    }

    /// Returns the worker gauge shared by every server this transport binds.
    #[must_use]
    pub const fn gauge(&self) -> &WorkerGauge {
        &self.gauge
    }

    /// Binds `service` to a new server and returns the server handle and a
    /// connected client.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the buffer is zero or no runtime is available.
    pub fn bind(
        &self,
        service: Arc<dyn CostSource>,
    ) -> std::result::Result<(ServerHandle, CostSourceClient), TransportError> {
        if self.buffer == 0 {
            return Err(TransportError::InvalidBuffer(self.buffer));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::NoRuntime(e.to_string()))?;

        let (tx, rx) = mpsc::channel(self.buffer);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let gauge = self.gauge.clone();
        let guard = gauge.enter();
        let task = runtime.spawn(serve(service, rx, shutdown_rx, gauge, guard));

        tracing::debug!(buffer = self.buffer, "in-memory server bound");

        Ok((
            ServerHandle {
                shutdown: Some(shutdown_tx),
                task: Some(task),
            },
            CostSourceClient { tx, deadline: None },
        ))
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

/// Accept loop. Runs until shutdown is requested or every client is gone.
async fn serve(
    service: Arc<dyn CostSource>,
    mut rx: mpsc::Receiver<Envelope>,
    mut shutdown_rx: oneshot::Receiver<()>,
    gauge: WorkerGauge,
    _guard: WorkerGuard,
) {
    let mut calls = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                tracing::debug!(in_flight = calls.len(), "server shutdown requested");
                rx.close();
                calls.shutdown().await;
                return;
            }
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let service = Arc::clone(&service);
                let worker = gauge.enter();
                calls.spawn(async move {
                    let _worker = worker;
                    handle_call(service.as_ref(), envelope).await;
                });
            }
            Some(joined) = calls.join_next(), if !calls.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        tracing::error!(error = %e, "call handler panicked");
                    }
                }
            }
        }
    }

    // Every client hung up: let in-flight calls finish.
    while calls.join_next().await.is_some() {}
}

/// Runs one call, dropping the handler if the caller goes away first.
async fn handle_call(service: &dyn CostSource, envelope: Envelope) {
    let Envelope { request, mut reply } = envelope;
    let method = request.method();

    let outcome = tokio::select! {
        result = dispatch(service, request) => Some(result),
        () = reply.closed() => None,
    };

    match outcome {
        Some(result) => {
            if reply.send(result).is_err() {
                tracing::debug!(%method, "caller went away before reply");
            }
        }
        None => tracing::debug!(%method, "caller abandoned call, handler cancelled"),
    }
}

/// Owns a running in-memory server.
///
/// Dropping the handle aborts the server; prefer [`ServerHandle::shutdown`],
/// which waits for every worker to be reclaimed.
#[derive(Debug)]
pub struct ServerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Stops accepting calls, aborts in-flight calls, and waits for every
    /// server task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The server may already have exited on its own.
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "server task ended abnormally");
            }
        }
    }

    /// Returns true if the accept loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Client handle for a cost-source server.
///
/// Cheap to clone; every clone shares the same connection.
#[derive(Debug, Clone)]
pub struct CostSourceClient {
    tx: mpsc::Sender<Envelope>,
    deadline: Option<Duration>,
}

impl CostSourceClient {
    /// Returns a client whose calls fail with
    /// [`ContractError::DeadlineExceeded`] after `deadline`.
    ///
    /// An abandoned call is cancelled on the server side too.
    #[must_use]
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            tx: self.tx.clone(),
            deadline: Some(deadline),
        }
    }

    /// Returns the per-call deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns true if the server is no longer accepting calls.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Sends an untyped request and waits for the reply.
    ///
    /// # Errors
    /// Returns the plugin's error, or a transport error if the server is
    /// gone, or [`ContractError::DeadlineExceeded`].
    pub async fn invoke(&self, request: Request) -> Result<Response> {
        let exchange = async {
            let (reply, reply_rx) = oneshot::channel();
            self.tx
                .send(Envelope { request, reply })
                .await
                .map_err(|_| ContractError::transport("connection closed"))?;
            reply_rx
                .await
                .map_err(|_| ContractError::transport("server dropped the call"))?
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, exchange)
                .await
                .map_err(|_| ContractError::DeadlineExceeded(deadline))?,
            None => exchange.await,
        }
    }

    async fn call<T>(
        &self,
        request: Request,
        extract: fn(Response) -> std::result::Result<T, Response>,
    ) -> Result<T> {
        let method = request.method();
        let response = self.invoke(request).await?;
        extract(response).map_err(|other| unexpected(method, other.method()))
    }

    /// Calls `Name`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn name(&self) -> Result<NameResponse> {
        self.call(Request::Name, |r| match r {
            Response::Name(v) => Ok(v),
            other => Err(other),
        })
        .await
    }

    /// Calls `Supports`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn supports(&self, req: SupportsRequest) -> Result<SupportsResponse> {
        self.call(Request::Supports(req), |r| match r {
            Response::Supports(v) => Ok(v),
            other => Err(other),
        })
        .await
    }

    /// Calls `GetActualCost`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn get_actual_cost(&self, req: ActualCostRequest) -> Result<ActualCostResponse> {
        self.call(Request::GetActualCost(req), |r| match r {
            Response::GetActualCost(v) => Ok(v),
            other => Err(other),
        })
        .await
    }

    /// Calls `GetProjectedCost`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn get_projected_cost(
        &self,
        req: ProjectedCostRequest,
    ) -> Result<ProjectedCostResponse> {
        self.call(Request::GetProjectedCost(req), |r| match r {
            Response::GetProjectedCost(v) => Ok(v),
            other => Err(other),
        })
        .await
    }

    /// Calls `GetPricingSpec`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn get_pricing_spec(&self, req: PricingSpecRequest) -> Result<PricingSpecResponse> {
        self.call(Request::GetPricingSpec(req), |r| match r {
            Response::GetPricingSpec(v) => Ok(v),
            other => Err(other),
        })
        .await
    }

    /// Calls `EstimateCost`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn estimate_cost(&self, req: EstimateCostRequest) -> Result<EstimateCostResponse> {
        self.call(Request::EstimateCost(req), |r| match r {
            Response::EstimateCost(v) => Ok(v),
            other => Err(other),
        })
        .await
    }

    /// Calls `GetRecommendations`.
    ///
    /// # Errors
    /// See [`CostSourceClient::invoke`].
    pub async fn get_recommendations(
        &self,
        req: RecommendationsRequest,
    ) -> Result<RecommendationsResponse> {
        self.call(Request::GetRecommendations(req), |r| match r {
            Response::GetRecommendations(v) => Ok(v),
            other => Err(other),
        })
        .await
    }
}

fn unexpected(expected: Method, got: Method) -> ContractError {
    ContractError::internal(format!("{expected} answered with a {got} response"))
}
