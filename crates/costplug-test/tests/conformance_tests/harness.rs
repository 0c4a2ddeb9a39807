//! Harness lifecycle: start once, stop idempotently, leak nothing.

use std::time::{Duration, Instant};

use costplug_core::{ContractError, Method};
use costplug_test::{Harness, HarnessError, HarnessState, MockCostSource};

#[tokio::test]
async fn stop_on_never_started_harness_returns_promptly() {
    let mut harness = Harness::mocked(MockCostSource::default());
    let start = Instant::now();
    tokio::time::timeout(Duration::from_secs(1), harness.stop())
        .await
        .expect("stop blocked on a never-started harness");
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(harness.state(), HarnessState::Stopped);
}

#[tokio::test]
async fn second_start_is_an_error() {
    let mut harness = Harness::mocked(MockCostSource::default());
    harness.start().unwrap();
    assert_eq!(harness.start(), Err(HarnessError::AlreadyStarted));
    // The first start is still usable.
    assert!(harness.client().unwrap().name().await.is_ok());
    harness.stop().await;
}

#[tokio::test]
async fn client_before_start_is_documented_error() {
    let harness = Harness::mocked(MockCostSource::default());
    assert_eq!(harness.client().unwrap_err(), HarnessError::NotStarted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_cycles_leak_no_workers() {
    for _ in 0..20 {
        let mut harness = Harness::mocked(MockCostSource::default());
        assert_eq!(harness.active_workers(), 0);
        harness.start().unwrap();

        let client = harness.client().unwrap();
        let mut calls = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let client = client.clone();
            calls.spawn(async move { client.name().await });
        }
        while let Some(res) = calls.join_next().await {
            res.unwrap().unwrap();
        }

        harness.stop().await;
        assert_eq!(harness.active_workers(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_reclaims_calls_stuck_in_injected_delay() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::Name, Duration::from_secs(30));
    let mut harness = Harness::mocked(mock);
    harness.start().unwrap();

    let client = harness.client().unwrap();
    let pending = tokio::spawn(async move { client.name().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.active_workers() >= 2);

    let start = Instant::now();
    harness.stop().await;
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(harness.active_workers(), 0);

    let err = pending.await.unwrap().unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err}");
}

#[tokio::test]
async fn caller_deadline_cancels_injected_delay() {
    let mock = MockCostSource::default();
    mock.set_delay(Method::Name, Duration::from_secs(30));
    let mut harness = Harness::mocked(mock);
    harness.start().unwrap();

    let client = harness
        .client()
        .unwrap()
        .with_deadline(Duration::from_millis(30));
    let err = client.name().await.unwrap_err();
    assert!(matches!(err, ContractError::DeadlineExceeded(_)));

    harness.stop().await;
    assert_eq!(harness.active_workers(), 0);
}

#[tokio::test]
async fn dropping_started_harness_aborts_server() {
    let mut harness = Harness::mocked(MockCostSource::default());
    harness.start().unwrap();
    let client = harness.client().unwrap();
    drop(harness);
    tokio::task::yield_now().await;

    let err = client.name().await.unwrap_err();
    assert!(err.is_transport());
}
