//! Mock injection through the harness: precedence, delays, exact counts.

use std::time::{Duration, Instant};

use costplug_core::{
    ContractError, Method, NameResponse, PricingSpecRequest, ProjectedCostRequest,
    ProjectedCostResponse, ResourceDescriptor, Response,
};
use costplug_test::{Harness, MockCostSource};

fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("aws", "aws:ec2:Instance", "m5.large", "eu-west-1")
}

fn started(mock: &MockCostSource) -> Harness {
    let mut harness = Harness::mocked(mock.clone());
    harness.start().unwrap();
    harness
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forced_error_seen_by_concurrent_callers_and_counted() {
    let mock = MockCostSource::default();
    mock.set_error(Method::GetPricingSpec, ContractError::internal("boom"));
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    let req = PricingSpecRequest {
        resource: resource(),
    };
    let (a, b) = tokio::join!(
        client.get_pricing_spec(req.clone()),
        client.get_pricing_spec(req)
    );

    assert_eq!(a.unwrap_err(), ContractError::internal("boom"));
    assert_eq!(b.unwrap_err(), ContractError::internal("boom"));
    assert_eq!(mock.call_count(Method::GetPricingSpec), 2);
    harness.stop().await;
}

#[tokio::test]
async fn forced_error_wins_over_delay_and_custom_response() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::GetProjectedCost, Duration::from_secs(10));
    mock.set_response(Response::GetProjectedCost(ProjectedCostResponse {
        unit_price: 1.0,
        currency: "EUR".into(),
        cost_per_month: 730.0,
        billing_detail: "custom".into(),
    }));
    mock.set_error(
        Method::GetProjectedCost,
        ContractError::unavailable("maintenance"),
    );
    let mut harness = started(&mock);

    let start = Instant::now();
    let err = harness
        .client()
        .unwrap()
        .get_projected_cost(ProjectedCostRequest {
            resource: resource(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ContractError::unavailable("maintenance"));
    assert!(start.elapsed() < Duration::from_secs(1));
    harness.stop().await;
}

#[tokio::test]
async fn injected_delay_is_a_lower_bound() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::Name, Duration::from_millis(40));
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    for _ in 0..3 {
        let start = Instant::now();
        client.name().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
    assert_eq!(mock.call_count(Method::Name), 3);
    harness.stop().await;
}

#[tokio::test]
async fn custom_response_returned_verbatim_after_delay() {
    let mock = MockCostSource::default();
    let custom = ProjectedCostResponse {
        unit_price: 2.5,
        currency: "EUR".into(),
        cost_per_month: 1825.0,
        billing_detail: "reserved".into(),
    };
    mock.set_response(Response::GetProjectedCost(custom.clone()));
    mock.set_delay(Method::GetProjectedCost, Duration::from_millis(20));
    let mut harness = started(&mock);

    let start = Instant::now();
    let resp = harness
        .client()
        .unwrap()
        .get_projected_cost(ProjectedCostRequest {
            resource: resource(),
        })
        .await
        .unwrap();
    assert_eq!(resp, custom);
    assert!(start.elapsed() >= Duration::from_millis(20));
    harness.stop().await;
}

#[tokio::test]
async fn clearing_restores_default_logic() {
    let mock = MockCostSource::new("steerable");
    mock.set_response(Response::Name(NameResponse {
        name: "impostor".into(),
    }));
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    assert_eq!(client.name().await.unwrap().name, "impostor");
    mock.clear(Method::Name);
    assert_eq!(client.name().await.unwrap().name, "steerable");
    assert_eq!(mock.call_count(Method::Name), 2);
    assert_eq!(mock.total_calls(), 2);
    harness.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counts_exact_under_many_concurrent_callers() {
    let mock = MockCostSource::default();
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..200 {
        let client = client.clone();
        tasks.spawn(async move {
            if i % 2 == 0 {
                client.name().await.map(|_| ())
            } else {
                client
                    .get_projected_cost(ProjectedCostRequest {
                        resource: resource(),
                    })
                    .await
                    .map(|_| ())
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap().unwrap();
    }

    assert_eq!(mock.call_count(Method::Name), 100);
    assert_eq!(mock.call_count(Method::GetProjectedCost), 100);
    assert_eq!(mock.total_calls(), 200);
    harness.stop().await;
}
