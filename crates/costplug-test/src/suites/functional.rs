//! Functional cases: every method answers with a well-formed response and
//! rejects malformed requests.

use costplug_core::{
    ActualCostRequest, Capability, CapabilitySet, EstimateCostRequest, Method, PricingSpecRequest,
    ProjectedCostRequest, SupportsRequest,
};

use super::{case, expect_invalid_argument, is_currency_code, sample_resource};
use crate::assert_case;
use crate::context::{CallResultExt, TestContext};
use crate::registry::{CaseResult, TestCase};

const DAY: u64 = 86_400;
const RANGE_START: u64 = 1_704_067_200;

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        case!(
            capabilities_declared,
            Functional,
            Basic,
            "Plugin declares every required capability"
        ),
        case!(plugin_name, Functional, Basic, "Name returns a non-empty name"),
        case!(
            supports_known_resource,
            Functional,
            Basic,
            "Supports answers for a well-formed resource"
        ),
        case!(
            supports_rejects_empty_type,
            Functional,
            Basic,
            "Supports rejects or declines a resource without a type"
        ),
        case!(
            projected_cost_shape,
            Functional,
            Basic,
            "GetProjectedCost returns non-negative prices in an ISO currency"
        ),
        case!(
            projected_cost_rejects_missing_region,
            Functional,
            Basic,
            "GetProjectedCost rejects a resource without a region"
        ),
        case!(
            pricing_spec_echoes_request,
            Functional,
            Basic,
            "GetPricingSpec describes the requested resource"
        ),
        case!(
            actual_cost_records_in_range,
            Functional,
            Basic,
            "GetActualCost records fall inside the requested range"
        ),
        case!(
            actual_cost_rejects_inverted_range,
            Functional,
            Basic,
            "GetActualCost rejects an end before the start"
        ),
        case!(
            estimate_cost_shape,
            Functional,
            Basic,
            "EstimateCost returns a non-negative monthly cost"
        ),
    ]
}

fn skipped(cap: Capability) -> CaseResult {
    Ok(format!("{cap:?} not declared; skipped"))
}

async fn capabilities_declared(ctx: &TestContext<'_>) -> CaseResult {
    let declared = ctx.harness().capabilities();
    let missing: CapabilitySet = CapabilitySet::required()
        .iter()
        .filter(|c| !declared.contains(*c))
        .collect();
    assert_case!(
        missing.is_empty(),
        "missing required capabilities: {:?}",
        missing.iter().collect::<Vec<_>>()
    );
    Ok(format!(
        "declared {:?}",
        declared.iter().collect::<Vec<_>>()
    ))
}

async fn plugin_name(ctx: &TestContext<'_>) -> CaseResult {
    let resp = ctx.client()?.name().await.during(Method::Name)?;
    assert_case!(!resp.name.trim().is_empty(), "plugin name is empty");
    Ok(format!("plugin name {:?}", resp.name))
}

async fn supports_known_resource(ctx: &TestContext<'_>) -> CaseResult {
    let resp = ctx
        .client()?
        .supports(SupportsRequest {
            resource: sample_resource(),
        })
        .await
        .during(Method::Supports)?;
    if resp.supported {
        Ok("sample resource supported".to_string())
    } else {
        assert_case!(
            resp.reason.as_deref().is_some_and(|r| !r.is_empty()),
            "unsupported without a reason"
        );
        Ok(format!("sample resource declined: {:?}", resp.reason))
    }
}

async fn supports_rejects_empty_type(ctx: &TestContext<'_>) -> CaseResult {
    let mut resource = sample_resource();
    resource.resource_type.clear();
    let result = ctx
        .client()?
        .supports(SupportsRequest { resource })
        .await;
    match result {
        Ok(resp) if !resp.supported => Ok("empty type declined".to_string()),
        other => expect_invalid_argument(Method::Supports, other),
    }
}

async fn projected_cost_shape(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::ProjectedCost) {
        return skipped(Capability::ProjectedCost);
    }
    let resp = ctx
        .client()?
        .get_projected_cost(ProjectedCostRequest {
            resource: sample_resource(),
        })
        .await
        .during(Method::GetProjectedCost)?;
    assert_case!(
        resp.unit_price >= 0.0 && resp.cost_per_month >= 0.0,
        "negative projection: unit {} month {}",
        resp.unit_price,
        resp.cost_per_month
    );
    assert_case!(
        is_currency_code(&resp.currency),
        "invalid currency {:?}",
        resp.currency
    );
    Ok(format!(
        "{} {}/month",
        resp.cost_per_month, resp.currency
    ))
}

async fn projected_cost_rejects_missing_region(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::ProjectedCost) {
        return skipped(Capability::ProjectedCost);
    }
    let mut resource = sample_resource();
    resource.region.clear();
    let result = ctx
        .client()?
        .get_projected_cost(ProjectedCostRequest { resource })
        .await;
    expect_invalid_argument(Method::GetProjectedCost, result)
}

async fn pricing_spec_echoes_request(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::PricingSpec) {
        return skipped(Capability::PricingSpec);
    }
    let resource = sample_resource();
    let spec = ctx
        .client()?
        .get_pricing_spec(PricingSpecRequest {
            resource: resource.clone(),
        })
        .await
        .during(Method::GetPricingSpec)?
        .spec;
    assert_case!(
        spec.provider == resource.provider
            && spec.resource_type == resource.resource_type
            && spec.sku == resource.sku
            && spec.region == resource.region,
        "spec describes a different resource: {spec:?}"
    );
    assert_case!(spec.rate_per_unit >= 0.0, "negative rate {}", spec.rate_per_unit);
    assert_case!(
        is_currency_code(&spec.currency),
        "invalid currency {:?}",
        spec.currency
    );
    Ok(format!(
        "{} {} {}",
        spec.rate_per_unit, spec.currency, spec.billing_mode
    ))
}

async fn actual_cost_records_in_range(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::ActualCost) {
        return skipped(Capability::ActualCost);
    }
    let (start, end) = (RANGE_START, RANGE_START + 7 * DAY);
    let resp = ctx
        .client()?
        .get_actual_cost(ActualCostRequest {
            resource_id: "i-0123456789abcdef0".to_string(),
            start,
            end,
        })
        .await
        .during(Method::GetActualCost)?;

    for record in &resp.results {
        assert_case!(
            (start..end).contains(&record.timestamp),
            "record at {} outside [{start}, {end})",
            record.timestamp
        );
        assert_case!(record.cost >= 0.0, "negative cost {}", record.cost);
    }
    assert_case!(
        resp.results.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
        "records not ordered by timestamp"
    );
    Ok(format!("{} records", resp.results.len()))
}

async fn actual_cost_rejects_inverted_range(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::ActualCost) {
        return skipped(Capability::ActualCost);
    }
    let result = ctx
        .client()?
        .get_actual_cost(ActualCostRequest {
            resource_id: "i-0123456789abcdef0".to_string(),
            start: RANGE_START + DAY,
            end: RANGE_START,
        })
        .await;
    expect_invalid_argument(Method::GetActualCost, result)
}

async fn estimate_cost_shape(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::Estimate) {
        return skipped(Capability::Estimate);
    }
    let mut req = EstimateCostRequest {
        resource_type: "aws:ec2:Instance".to_string(),
        attributes: Default::default(),
    };
    req.attributes
        .insert("instanceType".to_string(), "t3.small".to_string());

    let resp = ctx
        .client()?
        .estimate_cost(req)
        .await
        .during(Method::EstimateCost)?;
    assert_case!(
        resp.cost_monthly >= 0.0,
        "negative estimate {}",
        resp.cost_monthly
    );
    assert_case!(
        is_currency_code(&resp.currency),
        "invalid currency {:?}",
        resp.currency
    );
    Ok(format!("{} {}/month", resp.cost_monthly, resp.currency))
}
