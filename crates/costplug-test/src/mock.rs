//! Configurable fake cost source.
//!
//! Every call consults the per-method override table before running the
//! built-in logic, in this order:
//!
//! 1. forced error: returned immediately, no delay
//! 2. injected delay: the call sleeps at least that long
//! 3. custom response: returned verbatim
//! 4. deterministic default response
//!
//! Overrides and invocation counters live behind one lock. Clones share
//! state, so a test can keep a handle while the harness owns another.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use costplug_core::{
    ActualCostRequest, ActualCostResponse, CapabilitySet, ContractError, CostRecord, CostSource,
    EstimateCostRequest, EstimateCostResponse, Method, NameResponse, PricingSpec,
    PricingSpecRequest, PricingSpecResponse, ProjectedCostRequest, ProjectedCostResponse,
    Recommendation, RecommendationsRequest, RecommendationsResponse, ResourceDescriptor, Response,
    Result, SupportsRequest, SupportsResponse,
};

/// Name reported by [`MockCostSource::default`].
pub const DEFAULT_MOCK_NAME: &str = "mock-cost-source";

/// Providers the default logic can price.
pub const SUPPORTED_PROVIDERS: [&str; 3] = ["aws", "azure", "gcp"];

/// Number of recommendations the default logic synthesizes.
pub const MOCK_RECOMMENDATIONS: usize = 25;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;
const HOURS_PER_MONTH: f64 = 730.0;
const SECONDS_PER_DAY: u64 = 86_400;
const MAX_RECORD_DAYS: u64 = 366;
const CURRENCY: &str = "USD";
const DEFAULT_HOURLY_RATE: f64 = 0.05;

/// Per-method override entry.
#[derive(Debug, Clone, Default)]
struct MethodOverride {
    forced_error: Option<ContractError>,
    injected_delay: Option<Duration>,
    custom_response: Option<Response>,
}

impl MethodOverride {
    fn is_empty(&self) -> bool {
        self.forced_error.is_none()
            && self.injected_delay.is_none()
            && self.custom_response.is_none()
    }
}

/// The override table at one point in time, as captured by
/// [`MockCostSource::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct MockSnapshot {
    overrides: HashMap<Method, MethodOverride>,
}

impl MockSnapshot {
    /// Returns true if no method is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.values().all(MethodOverride::is_empty)
    }
}

#[derive(Debug, Default)]
struct MockState {
    overrides: HashMap<Method, MethodOverride>,
    calls: HashMap<Method, u64>,
}

/// A cost source whose behaviour tests can steer per method.
#[derive(Debug, Clone)]
pub struct MockCostSource {
    name: String,
    capabilities: CapabilitySet,
    state: Arc<Mutex<MockState>>,
}

impl MockCostSource {
    /// Creates a mock reporting `name` and every capability.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: CapabilitySet::all(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Restricts the declared capabilities. Methods gated by a missing
    /// capability answer `Unimplemented` unless overridden.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Forces `method` to fail with `error`.
    pub fn set_error(&self, method: Method, error: ContractError) {
        tracing::debug!(%method, %error, "mock: forcing error");
        self.update(method, |o| o.forced_error = Some(error));
    }

    /// Forces `method` to answer `Unimplemented`.
    pub fn set_unimplemented(&self, method: Method) {
        self.set_error(method, ContractError::unimplemented(method));
    }

    /// Delays every call to `method` by at least `delay`.
    pub fn set_delay(&self, method: Method, delay: Duration) {
        tracing::debug!(%method, ?delay, "mock: injecting delay");
        self.update(method, |o| o.injected_delay = Some(delay));
    }

    /// Returns `response` verbatim from the method it answers.
    pub fn set_response(&self, response: Response) {
        let method = response.method();
        tracing::debug!(%method, "mock: custom response");
        self.update(method, |o| o.custom_response = Some(response));
    }

    /// Removes every override for `method`. Counters are kept.
    pub fn clear(&self, method: Method) {
        self.state.lock().overrides.remove(&method);
    }

    /// Removes every override and zeroes every counter.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.overrides.clear();
        state.calls.clear();
    }

    /// Zeroes every counter. Overrides are kept.
    pub fn reset_counts(&self) {
        self.state.lock().calls.clear();
    }

    /// Captures the current overrides.
    #[must_use]
    pub fn snapshot(&self) -> MockSnapshot {
        MockSnapshot {
            overrides: self.state.lock().overrides.clone(),
        }
    }

    /// Replaces every override with `snapshot` and zeroes every counter.
    pub fn restore(&self, snapshot: &MockSnapshot) {
        let mut state = self.state.lock();
        state.overrides.clone_from(&snapshot.overrides);
        state.calls.clear();
    }

    /// Returns how many times `method` was invoked.
    #[must_use]
    pub fn call_count(&self, method: Method) -> u64 {
        self.state.lock().calls.get(&method).copied().unwrap_or(0)
    }

    /// Returns the number of invocations across every method.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.state.lock().calls.values().sum()
    }

    /// Returns true if any override is configured for `method`.
    #[must_use]
    pub fn is_overridden(&self, method: Method) -> bool {
        self.state
            .lock()
            .overrides
            .get(&method)
            .is_some_and(|o| !o.is_empty())
    }

    fn update(&self, method: Method, f: impl FnOnce(&mut MethodOverride)) {
        let mut state = self.state.lock();
        f(state.overrides.entry(method).or_default());
    }

    /// Counts the call and applies overrides. `Ok(None)` means the default
    /// logic should answer.
    async fn intercept(&self, method: Method) -> Result<Option<Response>> {
        let entry = {
            let mut state = self.state.lock();
            *state.calls.entry(method).or_insert(0) += 1;
            state.overrides.get(&method).cloned().unwrap_or_default()
        };

        if let Some(error) = entry.forced_error {
            return Err(error);
        }
        if let Some(delay) = entry.injected_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(response) = entry.custom_response {
            return Ok(Some(response));
        }

        match method.capability() {
            Some(cap) if !self.capabilities.contains(cap) => {
                Err(ContractError::unimplemented(method))
            }
            _ => Ok(None),
        }
    }
}

impl Default for MockCostSource {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_NAME)
    }
}

#[async_trait]
impl CostSource for MockCostSource {
    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    async fn name(&self) -> Result<NameResponse> {
        if let Some(Response::Name(resp)) = self.intercept(Method::Name).await? {
            return Ok(resp);
        }
        Ok(NameResponse {
            name: self.name.clone(),
        })
    }

    async fn supports(&self, req: SupportsRequest) -> Result<SupportsResponse> {
        if let Some(Response::Supports(resp)) = self.intercept(Method::Supports).await? {
            return Ok(resp);
        }
        supports(&req.resource)
    }

    async fn get_actual_cost(&self, req: ActualCostRequest) -> Result<ActualCostResponse> {
        if let Some(Response::GetActualCost(resp)) = self.intercept(Method::GetActualCost).await? {
            return Ok(resp);
        }
        actual_cost(&req)
    }

    async fn get_projected_cost(
        &self,
        req: ProjectedCostRequest,
    ) -> Result<ProjectedCostResponse> {
        if let Some(Response::GetProjectedCost(resp)) =
            self.intercept(Method::GetProjectedCost).await?
        {
            return Ok(resp);
        }
        projected_cost(&req.resource)
    }

    async fn get_pricing_spec(&self, req: PricingSpecRequest) -> Result<PricingSpecResponse> {
        if let Some(Response::GetPricingSpec(resp)) =
            self.intercept(Method::GetPricingSpec).await?
        {
            return Ok(resp);
        }
        pricing_spec(req.resource)
    }

    async fn estimate_cost(&self, req: EstimateCostRequest) -> Result<EstimateCostResponse> {
        if let Some(Response::EstimateCost(resp)) = self.intercept(Method::EstimateCost).await? {
            return Ok(resp);
        }
        estimate_cost(&req)
    }

    async fn get_recommendations(
        &self,
        req: RecommendationsRequest,
    ) -> Result<RecommendationsResponse> {
        if let Some(Response::GetRecommendations(resp)) =
            self.intercept(Method::GetRecommendations).await?
        {
            return Ok(resp);
        }
        recommendations(&req)
    }
}

// Default logic. Pure functions of the request so repeated calls agree.

fn validate_resource(resource: &ResourceDescriptor) -> Result<()> {
    if resource.resource_type.trim().is_empty() {
        return Err(ContractError::invalid_argument("resource type is required"));
    }
    if resource.region.trim().is_empty() {
        return Err(ContractError::invalid_argument("region is required"));
    }
    Ok(())
}

fn is_supported_provider(provider: &str) -> bool {
    SUPPORTED_PROVIDERS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(provider))
}

fn hourly_rate(sku: &str) -> f64 {
    match sku {
        "t3.micro" => 0.0104,
        "t3.small" => 0.0208,
        "m5.large" => 0.096,
        _ => DEFAULT_HOURLY_RATE,
    }
}

fn supports(resource: &ResourceDescriptor) -> Result<SupportsResponse> {
    if resource.resource_type.trim().is_empty() {
        return Err(ContractError::invalid_argument("resource type is required"));
    }
    if is_supported_provider(&resource.provider) {
        Ok(SupportsResponse {
            supported: true,
            reason: None,
        })
    } else {
        Ok(SupportsResponse {
            supported: false,
            reason: Some(format!("provider {:?} is not supported", resource.provider)),
        })
    }
}

fn actual_cost(req: &ActualCostRequest) -> Result<ActualCostResponse> {
    if req.resource_id.trim().is_empty() {
        return Err(ContractError::invalid_argument("resource id is required"));
    }
    if req.end <= req.start {
        return Err(ContractError::invalid_argument(format!(
            "end {} must be after start {}",
            req.end, req.start
        )));
    }

    let days = (req.end - req.start).div_ceil(SECONDS_PER_DAY).min(MAX_RECORD_DAYS);
    let daily_cost = DEFAULT_HOURLY_RATE * 24.0;
    let results = (0..days)
        .map(|day| CostRecord {
            timestamp: req.start + day * SECONDS_PER_DAY,
            cost: daily_cost,
            usage_amount: 24.0,
            usage_unit: "hour".to_string(),
            source: "mock".to_string(),
        })
        .collect();

    Ok(ActualCostResponse { results })
}

fn projected_cost(resource: &ResourceDescriptor) -> Result<ProjectedCostResponse> {
    validate_resource(resource)?;
    let unit_price = hourly_rate(&resource.sku);
    Ok(ProjectedCostResponse {
        unit_price,
        currency: CURRENCY.to_string(),
        cost_per_month: unit_price * HOURS_PER_MONTH,
        billing_detail: format!("on-demand {} hourly rate", resource.sku),
    })
}

fn pricing_spec(resource: ResourceDescriptor) -> Result<PricingSpecResponse> {
    validate_resource(&resource)?;
    let rate_per_unit = hourly_rate(&resource.sku);
    Ok(PricingSpecResponse {
        spec: PricingSpec {
            provider: resource.provider,
            resource_type: resource.resource_type,
            sku: resource.sku,
            region: resource.region,
            billing_mode: "per_hour".to_string(),
            rate_per_unit,
            currency: CURRENCY.to_string(),
        },
    })
}

fn estimate_cost(req: &EstimateCostRequest) -> Result<EstimateCostResponse> {
    if req.resource_type.trim().is_empty() {
        return Err(ContractError::invalid_argument("resource type is required"));
    }
    let sku = req
        .attributes
        .get("instanceType")
        .or_else(|| req.attributes.get("sku"))
        .map_or("", String::as_str);
    Ok(EstimateCostResponse {
        currency: CURRENCY.to_string(),
        cost_monthly: hourly_rate(sku) * HOURS_PER_MONTH,
    })
}

fn recommendations(req: &RecommendationsRequest) -> Result<RecommendationsResponse> {
    let offset = if req.page_token.is_empty() {
        0
    } else {
        req.page_token
            .parse::<usize>()
            .ok()
            .filter(|o| *o <= MOCK_RECOMMENDATIONS)
            .ok_or_else(|| {
                ContractError::invalid_argument(format!("invalid page token {:?}", req.page_token))
            })?
    };

    let page_size = match req.page_size as usize {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    };
    let end = (offset + page_size).min(MOCK_RECOMMENDATIONS);

    let recommendations = (offset..end)
        .map(|i| Recommendation {
            id: format!("rec-{i:03}"),
            resource_id: format!("i-{i:08x}"),
            action: if i % 2 == 0 { "rightsize" } else { "terminate" }.to_string(),
            estimated_savings: 5.0 + i as f64,
            currency: CURRENCY.to_string(),
        })
        .collect();

    let next_page_token = if end < MOCK_RECOMMENDATIONS {
        end.to_string()
    } else {
        String::new()
    };

    Ok(RecommendationsResponse {
        recommendations,
        next_page_token,
    })
}
