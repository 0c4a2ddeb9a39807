//! Latency measurement through the harness client.

use std::time::Duration;

use costplug_core::{
    CapabilitySet, ContractError, Method, RecommendationsRequest,
};
use costplug_test::{
    BaselineTable, CertificationTier, Harness, LatencyMeasurer, MockCostSource, TestFailure,
};

fn started(mock: &MockCostSource) -> Harness {
    let mut harness = Harness::mocked(mock.clone());
    harness.start().unwrap();
    harness
}

#[tokio::test]
async fn injected_delay_bounds_every_sample() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::Name, Duration::from_millis(150));
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    let run = LatencyMeasurer::new(10)
        .measure(Method::Name, || client.name())
        .await;
    let m = run.measurement().unwrap();

    assert_eq!(m.iterations, 10);
    assert!(m.min >= Duration::from_millis(150), "{m}");
    assert!(m.min <= m.avg && m.avg <= m.max, "{m}");
    assert_eq!(mock.call_count(Method::Name), 10);
    harness.stop().await;
}

#[tokio::test]
async fn slow_name_fails_standard_but_passes_basic() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::Name, Duration::from_millis(150));
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    let run = LatencyMeasurer::new(3)
        .measure(Method::Name, || client.name())
        .await;
    let baselines = BaselineTable::default();

    let err = run
        .evaluate(&baselines, CertificationTier::Standard)
        .unwrap_err();
    match err {
        TestFailure::Latency {
            observed,
            threshold,
            ..
        } => {
            assert!(observed >= Duration::from_millis(150));
            assert_eq!(threshold, Duration::from_millis(100));
        }
        other => panic!("expected latency failure, got {other}"),
    }

    let basic = run.evaluate(&baselines, CertificationTier::Basic).unwrap();
    assert!(basic.contains("no basic latency gate"), "{basic}");
    harness.stop().await;
}

#[tokio::test]
async fn unimplemented_capability_is_skipped_not_failed() {
    let mock = MockCostSource::default().with_capabilities(CapabilitySet::required());
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    let run = LatencyMeasurer::new(5)
        .measure(Method::GetRecommendations, || {
            client.get_recommendations(RecommendationsRequest::default())
        })
        .await;

    assert!(run.all_unimplemented());
    assert_eq!(run.unimplemented(), 5);
    assert!(run.measurement().is_none());
    let details = run
        .evaluate(&BaselineTable::default(), CertificationTier::Advanced)
        .unwrap();
    assert!(details.contains("not implemented"));
    harness.stop().await;
}

#[tokio::test]
async fn hard_error_stops_measurement_and_fails() {
    let mock = MockCostSource::default();
    mock.set_error(Method::Name, ContractError::unavailable("draining"));
    let mut harness = started(&mock);
    let client = harness.client().unwrap();

    let run = LatencyMeasurer::new(10)
        .measure(Method::Name, || client.name())
        .await;

    assert_eq!(mock.call_count(Method::Name), 1);
    assert_eq!(run.error(), Some(&ContractError::unavailable("draining")));
    let err = run
        .evaluate(&BaselineTable::default(), CertificationTier::Basic)
        .unwrap_err();
    assert_eq!(
        err,
        TestFailure::call(Method::Name, ContractError::unavailable("draining"))
    );
    harness.stop().await;
}
