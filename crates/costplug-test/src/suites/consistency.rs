//! Consistency cases: repeated and related calls agree with each other.

use std::collections::HashSet;

use costplug_core::{
    Capability, ContractError, Method, PricingSpecRequest, ProjectedCostRequest,
    RecommendationsRequest,
};

use super::{case, expect_invalid_argument, sample_resource};
use crate::assert_case;
use crate::context::{CallResultExt, TestContext};
use crate::error::TestFailure;
use crate::registry::{CaseResult, TestCase};

const PAGE_SIZE: u32 = 7;
const MAX_PAGES: usize = 1_000;

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        case!(
            name_is_stable,
            Consistency,
            Standard,
            "Name returns the same value on every call"
        ),
        case!(
            projected_cost_deterministic,
            Consistency,
            Standard,
            "GetProjectedCost is stable for identical requests"
        ),
        case!(
            currency_agreement,
            Consistency,
            Standard,
            "GetProjectedCost and GetPricingSpec agree on currency and rate"
        ),
        case!(
            recommendations_paginate,
            Consistency,
            Standard,
            "GetRecommendations pages are bounded, disjoint and terminate"
        ),
        case!(
            recommendations_reject_malformed_token,
            Consistency,
            Standard,
            "GetRecommendations rejects a token it never issued"
        ),
    ]
}

async fn name_is_stable(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    let first = client.name().await.during(Method::Name)?.name;
    for _ in 0..3 {
        let next = client.name().await.during(Method::Name)?.name;
        assert_case!(next == first, "name changed from {first:?} to {next:?}");
    }
    Ok(format!("stable name {first:?}"))
}

async fn projected_cost_deterministic(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::ProjectedCost) {
        return Ok("ProjectedCost not declared; skipped".to_string());
    }
    let client = ctx.client()?;
    let req = ProjectedCostRequest {
        resource: sample_resource(),
    };
    let first = client
        .get_projected_cost(req.clone())
        .await
        .during(Method::GetProjectedCost)?;
    let second = client
        .get_projected_cost(req)
        .await
        .during(Method::GetProjectedCost)?;
    assert_case!(
        first == second,
        "projections differ: {first:?} vs {second:?}"
    );
    Ok(format!("{} {}/month twice", first.cost_per_month, first.currency))
}

async fn currency_agreement(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.supports(Capability::ProjectedCost) || !ctx.supports(Capability::PricingSpec) {
        return Ok("ProjectedCost or PricingSpec not declared; skipped".to_string());
    }
    let client = ctx.client()?;
    let projection = client
        .get_projected_cost(ProjectedCostRequest {
            resource: sample_resource(),
        })
        .await
        .during(Method::GetProjectedCost)?;
    let spec = client
        .get_pricing_spec(PricingSpecRequest {
            resource: sample_resource(),
        })
        .await
        .during(Method::GetPricingSpec)?
        .spec;

    assert_case!(
        projection.currency == spec.currency,
        "currency mismatch: projection {} vs spec {}",
        projection.currency,
        spec.currency
    );
    assert_case!(
        (projection.unit_price - spec.rate_per_unit).abs() <= f64::EPSILON * 16.0,
        "unit price {} differs from spec rate {}",
        projection.unit_price,
        spec.rate_per_unit
    );
    Ok(format!("both priced in {}", spec.currency))
}

async fn recommendations_paginate(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    let mut seen = HashSet::new();
    let mut token = String::new();

    for page in 0..MAX_PAGES {
        let result = client
            .get_recommendations(RecommendationsRequest {
                page_size: PAGE_SIZE,
                page_token: token,
            })
            .await;
        let resp = match result {
            Err(e) if e.is_unimplemented() && page == 0 => {
                return Ok("recommendations not implemented".to_string());
            }
            other => other.during(Method::GetRecommendations)?,
        };

        assert_case!(
            resp.recommendations.len() <= PAGE_SIZE as usize,
            "page {page} holds {} items, page size {PAGE_SIZE}",
            resp.recommendations.len()
        );
        for rec in &resp.recommendations {
            assert_case!(
                seen.insert(rec.id.clone()),
                "recommendation {} returned twice",
                rec.id
            );
        }

        if resp.next_page_token.is_empty() {
            return Ok(format!("{} recommendations over {} pages", seen.len(), page + 1));
        }
        token = resp.next_page_token;
    }

    Err(TestFailure::assertion(format!(
        "pagination did not terminate after {MAX_PAGES} pages"
    )))
}

async fn recommendations_reject_malformed_token(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx
        .client()?
        .get_recommendations(RecommendationsRequest {
            page_size: PAGE_SIZE,
            page_token: "%%not-a-token%%".to_string(),
        })
        .await;
    match result {
        Err(ContractError::Unimplemented { .. }) => {
            Ok("recommendations not implemented".to_string())
        }
        other => expect_invalid_argument(Method::GetRecommendations, other),
    }
}
