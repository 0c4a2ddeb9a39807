//! The cost-source plugin contract.
//!
//! Every plugin implements the same set of methods so the conformance suite
//! can drive any implementation through one client.

use async_trait::async_trait;

use crate::error::{ContractError, Result};
use crate::types::{
    ActualCostRequest, ActualCostResponse, CapabilitySet, EstimateCostRequest,
    EstimateCostResponse, Method, NameResponse, PricingSpecRequest, PricingSpecResponse,
    ProjectedCostRequest, ProjectedCostResponse, RecommendationsRequest, RecommendationsResponse,
    Request, Response, SupportsRequest, SupportsResponse,
};

/// A cost-source plugin.
///
/// # Implementation Guidelines
///
/// 1. **capabilities**: Declare the optional method groups you implement.
///    Queried once when a harness is built.
///
/// 2. **Validation**: Reject malformed requests with
///    [`ContractError::InvalidArgument`] rather than returning empty data.
///
/// 3. **Optional methods**: `get_recommendations` defaults to
///    [`ContractError::Unimplemented`]; leave it alone if you do not
///    support it.
///
/// # Example
///
/// ```rust,ignore
/// use costplug_core::{CostSource, NameResponse, Result};
/// use async_trait::async_trait;
///
/// struct MyPlugin;
///
/// #[async_trait]
/// impl CostSource for MyPlugin {
///     async fn name(&self) -> Result<NameResponse> {
///         Ok(NameResponse { name: "my-plugin".into() })
///     }
///     // ... implement the remaining methods
/// }
/// ```
#[async_trait]
pub trait CostSource: Send + Sync + 'static {
    /// Returns the optional capabilities this plugin implements.
    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::required()
    }

    /// Returns the plugin's name.
    async fn name(&self) -> Result<NameResponse>;

    /// Reports whether the plugin can price a resource.
    async fn supports(&self, req: SupportsRequest) -> Result<SupportsResponse>;

    /// Returns historical cost records for a resource.
    async fn get_actual_cost(&self, req: ActualCostRequest) -> Result<ActualCostResponse>;

    /// Returns the projected monthly cost for a resource.
    async fn get_projected_cost(
        &self,
        req: ProjectedCostRequest,
    ) -> Result<ProjectedCostResponse>;

    /// Returns the pricing specification for a resource.
    async fn get_pricing_spec(&self, req: PricingSpecRequest) -> Result<PricingSpecResponse>;

    /// Estimates the cost of a resource that does not exist yet.
    async fn estimate_cost(&self, req: EstimateCostRequest) -> Result<EstimateCostResponse>;

    /// Returns a page of cost-saving recommendations.
    async fn get_recommendations(
        &self,
        _req: RecommendationsRequest,
    ) -> Result<RecommendationsResponse> {
        Err(ContractError::unimplemented(Method::GetRecommendations))
    }
}

/// Routes a [`Request`] to the matching method of `service`.
///
/// # Errors
/// Returns whatever error the service method returns.
pub async fn dispatch(service: &dyn CostSource, request: Request) -> Result<Response> {
    let response = match request {
        Request::Name => Response::Name(service.name().await?),
        Request::Supports(req) => Response::Supports(service.supports(req).await?),
        Request::GetActualCost(req) => Response::GetActualCost(service.get_actual_cost(req).await?),
        Request::GetProjectedCost(req) => {
            Response::GetProjectedCost(service.get_projected_cost(req).await?)
        }
        Request::GetPricingSpec(req) => {
            Response::GetPricingSpec(service.get_pricing_spec(req).await?)
        }
        Request::EstimateCost(req) => Response::EstimateCost(service.estimate_cost(req).await?),
        Request::GetRecommendations(req) => {
            Response::GetRecommendations(service.get_recommendations(req).await?)
        }
    };
    Ok(response)
}
