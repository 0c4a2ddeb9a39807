//! Concurrency cases: parallel callers are served correctly.
//!
//! Every case joins all the tasks it spawns before returning.

use costplug_core::{
    CostSourceClient, EstimateCostRequest, Method, PricingSpecRequest,
    ProjectedCostRequest, ProjectedCostResponse, ResourceDescriptor, SupportsRequest,
};
use tokio::task::JoinSet;

use super::{case, sample_resource};
use crate::assert_case;
use crate::context::{CallResultExt, TestContext};
use crate::error::TestFailure;
use crate::registry::{CaseResult, TestCase};

const SKUS: [&str; 4] = ["t3.micro", "t3.small", "m5.large", "c5.xlarge"];

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        case!(
            concurrent_projected_cost,
            Concurrency,
            Standard,
            "Parallel identical GetProjectedCost calls all succeed and agree"
        ),
        case!(
            concurrent_mixed_methods,
            Concurrency,
            Advanced,
            "Parallel calls across methods all succeed"
        ),
        case!(
            concurrent_distinct_resources,
            Concurrency,
            Advanced,
            "Parallel calls for different resources do not cross responses"
        ),
    ]
}

/// Waits for every task, failing on the first error or panic.
async fn join_all<T: 'static>(
    mut tasks: JoinSet<Result<T, TestFailure>>,
) -> Result<Vec<T>, TestFailure> {
    let mut results = Vec::with_capacity(tasks.len());
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| TestFailure::assertion(format!("caller task failed: {e}")))
            .and_then(|r| r);
        match outcome {
            Ok(value) => results.push(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

fn resource_for(sku: &str) -> ResourceDescriptor {
    ResourceDescriptor::new("aws", "aws:ec2:Instance", sku, "us-east-1")
}

async fn concurrent_projected_cost(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    let callers = ctx.config().concurrency;

    let mut tasks = JoinSet::new();
    for _ in 0..callers {
        let client = client.clone();
        tasks.spawn(async move {
            client
                .get_projected_cost(ProjectedCostRequest {
                    resource: sample_resource(),
                })
                .await
                .during(Method::GetProjectedCost)
        });
    }
    let responses = join_all(tasks).await?;

    let first = responses.first();
    assert_case!(
        responses.iter().all(|r| Some(r) == first),
        "parallel projections disagree"
    );
    if let Some(mock) = ctx.mock() {
        let count = mock.call_count(Method::GetProjectedCost);
        assert_case!(
            count == u64::from(callers),
            "mock observed {count} calls, expected {callers}"
        );
    }
    Ok(format!("{callers} parallel callers agreed"))
}

async fn call_round_robin(client: CostSourceClient, i: u32) -> Result<Method, TestFailure> {
    let method = match i % 5 {
        0 => {
            client.name().await.during(Method::Name)?;
            Method::Name
        }
        1 => {
            client
                .supports(SupportsRequest {
                    resource: sample_resource(),
                })
                .await
                .during(Method::Supports)?;
            Method::Supports
        }
        2 => {
            client
                .get_projected_cost(ProjectedCostRequest {
                    resource: sample_resource(),
                })
                .await
                .during(Method::GetProjectedCost)?;
            Method::GetProjectedCost
        }
        3 => {
            client
                .get_pricing_spec(PricingSpecRequest {
                    resource: sample_resource(),
                })
                .await
                .during(Method::GetPricingSpec)?;
            Method::GetPricingSpec
        }
        _ => {
            client
                .estimate_cost(EstimateCostRequest {
                    resource_type: "aws:ec2:Instance".to_string(),
                    attributes: Default::default(),
                })
                .await
                .during(Method::EstimateCost)?;
            Method::EstimateCost
        }
    };
    Ok(method)
}

async fn concurrent_mixed_methods(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;
    let callers = ctx.config().concurrency.max(5);

    let mut tasks = JoinSet::new();
    for i in 0..callers {
        tasks.spawn(call_round_robin(client.clone(), i));
    }
    let methods = join_all(tasks).await?;
    assert_case!(
        methods.len() == callers as usize,
        "{} of {callers} callers returned",
        methods.len()
    );

    if let Some(mock) = ctx.mock() {
        let total = mock.total_calls();
        assert_case!(
            total == u64::from(callers),
            "mock observed {total} calls, expected {callers}"
        );
    }
    Ok(format!("{callers} mixed callers succeeded"))
}

async fn concurrent_distinct_resources(ctx: &TestContext<'_>) -> CaseResult {
    let client = ctx.client()?;

    let mut expected = Vec::with_capacity(SKUS.len());
    for sku in SKUS {
        let resp = client
            .get_projected_cost(ProjectedCostRequest {
                resource: resource_for(sku),
            })
            .await
            .during(Method::GetProjectedCost)?;
        expected.push((sku, resp));
    }

    let rounds = ctx.config().concurrency.max(1);
    let mut tasks: JoinSet<Result<(&'static str, ProjectedCostResponse), TestFailure>> =
        JoinSet::new();
    for round in 0..rounds {
        for sku in SKUS {
            let client = client.clone();
            tasks.spawn(async move {
                if round % 2 == 1 {
                    tokio::task::yield_now().await;
                }
                let resp = client
                    .get_projected_cost(ProjectedCostRequest {
                        resource: resource_for(sku),
                    })
                    .await
                    .during(Method::GetProjectedCost)?;
                Ok((sku, resp))
            });
        }
    }
    let responses = join_all(tasks).await?;

    for (sku, resp) in &responses {
        let want = expected
            .iter()
            .find(|(s, _)| s == sku)
            .map(|(_, r)| r)
            .ok_or_else(|| TestFailure::assertion(format!("unexpected resource {sku}")))?;
        assert_case!(
            resp == want,
            "response for {sku} crossed: got {resp:?}, expected {want:?}"
        );
    }
    Ok(format!(
        "{} parallel calls over {} resources matched",
        responses.len(),
        SKUS.len()
    ))
}
