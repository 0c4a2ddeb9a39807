//! Performance cases: one latency measurement per contract method.

use costplug_core::{
    ActualCostRequest, EstimateCostRequest, Method, PricingSpecRequest, ProjectedCostRequest,
    RecommendationsRequest, SupportsRequest,
};

use super::{case, sample_resource};
use crate::context::TestContext;
use crate::registry::{CaseResult, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        case!(latency_name, Performance, Standard, "Name average latency"),
        case!(
            latency_supports,
            Performance,
            Standard,
            "Supports average latency"
        ),
        case!(
            latency_actual_cost,
            Performance,
            Standard,
            "GetActualCost average latency"
        ),
        case!(
            latency_projected_cost,
            Performance,
            Standard,
            "GetProjectedCost average latency"
        ),
        case!(
            latency_pricing_spec,
            Performance,
            Standard,
            "GetPricingSpec average latency"
        ),
        case!(
            latency_estimate_cost,
            Performance,
            Standard,
            "EstimateCost average latency"
        ),
        case!(
            latency_recommendations,
            Performance,
            Standard,
            "GetRecommendations average latency"
        ),
    ]
}

async fn latency_name(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::Name, || client.name())
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}

async fn latency_supports(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::Supports, || {
            client.supports(SupportsRequest {
                resource: sample_resource(),
            })
        })
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}

async fn latency_actual_cost(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::GetActualCost, || {
            client.get_actual_cost(ActualCostRequest {
                resource_id: "i-0123456789abcdef0".to_string(),
                start: 1_704_067_200,
                end: 1_704_067_200 + 30 * 86_400,
            })
        })
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}

async fn latency_projected_cost(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::GetProjectedCost, || {
            client.get_projected_cost(ProjectedCostRequest {
                resource: sample_resource(),
            })
        })
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}

async fn latency_pricing_spec(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::GetPricingSpec, || {
            client.get_pricing_spec(PricingSpecRequest {
                resource: sample_resource(),
            })
        })
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}

async fn latency_estimate_cost(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::EstimateCost, || {
            client.estimate_cost(EstimateCostRequest {
                resource_type: "aws:ec2:Instance".to_string(),
                attributes: Default::default(),
            })
        })
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}

async fn latency_recommendations(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    ctx.measurer()
        .measure(Method::GetRecommendations, || {
            client.get_recommendations(RecommendationsRequest::default())
        })
        .await
        .evaluate(ctx.baselines(), ctx.tier())
}
