//! Full conformance runs against the mock.

use std::time::Duration;

use costplug_core::{CapabilitySet, ContractError, Method};
use costplug_test::{
    CaseResult, Category, CertificationTier, ConformanceConfig, ConformanceReport,
    ConformanceRunner, Harness, HarnessError, HarnessState, MockCostSource, PerformanceBaseline,
    RegistryBuilder, TestCase, TestContext, TestFailure,
};
use futures::FutureExt;
use futures::future::BoxFuture;

fn assert_counts_agree(report: &ConformanceReport) {
    assert_eq!(report.total, report.passed + report.failed);
    assert_eq!(report.total, report.results.len());
}

fn explode() -> CaseResult {
    panic!("standard case blew up")
}

fn panicking_case<'a>(_ctx: &'a TestContext<'a>) -> BoxFuture<'a, CaseResult> {
    async { explode() }.boxed()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn builtin_suite_passes_against_default_mock_at_every_tier() {
    for tier in CertificationTier::ALL {
        let mut harness = Harness::mocked(MockCostSource::default());
        let report = ConformanceRunner::global().run(tier, &mut harness).await;

        assert_counts_agree(&report);
        assert_eq!(report.failed, 0, "{report}");
        assert_eq!(report.total, costplug_test::Registry::global().select(tier).len());
        assert_eq!(harness.state(), HarnessState::Stopped);
        assert_eq!(harness.active_workers(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_case_is_isolated() {
    let mut builder = RegistryBuilder::builtin();
    let builtin = builder.len();
    builder
        .register(TestCase::new(
            "deliberate_panic",
            Category::Consistency,
            CertificationTier::Standard,
            "panics on purpose",
            panicking_case,
        ))
        .unwrap();
    let registry = builder.build();
    let expected = registry.select(CertificationTier::Standard).len();
    assert!(expected > 1 && expected <= builtin + 1);

    let mut harness = Harness::mocked(MockCostSource::default());
    let report = ConformanceRunner::new(&registry)
        .run(CertificationTier::Standard, &mut harness)
        .await;

    assert_counts_agree(&report);
    assert_eq!(report.total, expected);
    assert_eq!(report.failed, 1, "{report}");
    let outcome = report.outcome("deliberate_panic").unwrap();
    assert!(!outcome.success());
    assert_eq!(
        outcome.error(),
        Some(&TestFailure::Panic("standard case blew up".into()))
    );
}

#[tokio::test]
async fn setup_failure_aborts_run() {
    let mut harness = Harness::mocked(MockCostSource::default()).with_buffer(0);
    let report = ConformanceRunner::global()
        .run(CertificationTier::Basic, &mut harness)
        .await;

    assert!(matches!(report.setup_error, Some(HarnessError::Transport(_))));
    assert_eq!(report.total, 0);
    assert_counts_agree(&report);
    assert!(!report.is_success());
    assert_eq!(harness.state(), HarnessState::Stopped);
    assert_eq!(harness.mock().unwrap().total_calls(), 0);
}

#[tokio::test]
async fn run_wide_injection_survives_case_resets() {
    let mock = MockCostSource::default();
    mock.set_error(Method::GetPricingSpec, ContractError::unavailable("maintenance"));
    let mut harness = Harness::mocked(mock.clone());

    let report = ConformanceRunner::global()
        .run(CertificationTier::Standard, &mut harness)
        .await;

    for case in [
        "pricing_spec_echoes_request",
        "currency_agreement",
        "latency_pricing_spec",
    ] {
        let outcome = report.outcome(case).unwrap();
        assert!(!outcome.success(), "{case} should fail: {report}");
        assert!(outcome.details().contains("maintenance"));
    }
    assert!(mock.is_overridden(Method::GetPricingSpec));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn missing_optional_capability_passes_latency() {
    let mock = MockCostSource::default().with_capabilities(CapabilitySet::required());
    let mut harness = Harness::mocked(mock);
    let report = ConformanceRunner::global()
        .run(CertificationTier::Advanced, &mut harness)
        .await;

    assert_eq!(report.failed, 0, "{report}");
    let latency = report.outcome("latency_recommendations").unwrap();
    assert!(latency.success());
    assert!(latency.details().contains("not implemented"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_method_fails_only_its_latency_case() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::Supports, Duration::from_millis(30));

    let mut config = ConformanceConfig::for_tier(CertificationTier::Standard);
    config.iterations = 3;
    config.baselines.push(PerformanceBaseline::new(
        Method::Supports,
        Duration::from_millis(10),
        Duration::from_millis(5),
    ));
    let runner = ConformanceRunner::with_config(costplug_test::Registry::global(), config).unwrap();

    let mut harness = Harness::mocked(mock);
    let report = runner.run_configured(&mut harness).await;

    let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
    assert_eq!(failed, ["latency_supports"], "{report}");
    let outcome = report.outcome("latency_supports").unwrap();
    match outcome.error() {
        Some(TestFailure::Latency {
            method,
            observed,
            threshold,
            tier,
        }) => {
            assert_eq!(*method, Method::Supports);
            assert!(*observed >= Duration::from_millis(30));
            assert_eq!(*threshold, Duration::from_millis(10));
            assert_eq!(*tier, CertificationTier::Standard);
        }
        other => panic!("expected latency failure, got {other:?}"),
    }
}

#[tokio::test]
async fn forced_error_fails_dependent_cases_only() {
    let mock = MockCostSource::default();
    mock.set_error(Method::EstimateCost, ContractError::internal("pricing backend down"));
    let mut harness = Harness::mocked(mock);

    let report = ConformanceRunner::global()
        .run(CertificationTier::Basic, &mut harness)
        .await;

    let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
    assert_eq!(failed, ["estimate_cost_shape"], "{report}");
    assert!(
        report
            .outcome("estimate_cost_shape")
            .unwrap()
            .details()
            .contains("pricing backend down")
    );
}

#[tokio::test]
async fn started_harness_stays_running_and_reusable() {
    let mut harness = Harness::mocked(MockCostSource::default());
    harness.start().unwrap();

    let runner = ConformanceRunner::global();
    let first = runner.run(CertificationTier::Basic, &mut harness).await;
    let second = runner.run(CertificationTier::Basic, &mut harness).await;

    assert!(first.is_success() && second.is_success());
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(harness.state(), HarnessState::Started);
    harness.stop().await;
    assert_eq!(harness.active_workers(), 0);
}

#[tokio::test]
async fn report_serializes_stable_fields() {
    let mut harness = Harness::mocked(MockCostSource::default());
    let report = ConformanceRunner::global()
        .run(CertificationTier::Basic, &mut harness)
        .await;

    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(value["total"], report.total);
    assert_eq!(value["passed"], report.passed);
    assert_eq!(value["failed"], 0);
    assert_eq!(value["tier"], "basic");
    assert_eq!(value["results"].as_array().unwrap().len(), report.total);
}
