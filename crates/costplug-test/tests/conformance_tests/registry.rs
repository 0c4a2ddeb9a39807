//! Registry selection by tier.

use costplug_test::{
    CaseResult, Category, CertificationTier, Registry, RegistryBuilder, TestCase, TestContext,
};
use futures::FutureExt;
use futures::future::BoxFuture;

fn noop<'a>(_ctx: &'a TestContext<'a>) -> BoxFuture<'a, CaseResult> {
    async { Ok(String::new()) }.boxed()
}

fn case(name: &str, tier: CertificationTier) -> TestCase {
    TestCase::new(name, Category::Functional, tier, name, noop)
}

#[test]
fn select_standard_from_three_tiers_returns_two_in_order() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(case("basic_case", CertificationTier::Basic))
        .unwrap()
        .register(case("advanced_case", CertificationTier::Advanced))
        .unwrap()
        .register(case("standard_case", CertificationTier::Standard))
        .unwrap();
    let registry = builder.build();

    let selected: Vec<_> = registry
        .select(CertificationTier::Standard)
        .into_iter()
        .map(TestCase::name)
        .collect();
    assert_eq!(selected, ["basic_case", "standard_case"]);
}

#[test]
fn empty_registry_selects_nothing() {
    let registry = RegistryBuilder::new().build();
    for tier in CertificationTier::ALL {
        assert!(registry.select(tier).is_empty());
    }
}

#[test]
fn builtin_suite_grows_with_tier() {
    let registry = Registry::global();
    let basic = registry.select(CertificationTier::Basic);
    let standard = registry.select(CertificationTier::Standard);
    let advanced = registry.select(CertificationTier::Advanced);

    assert!(!basic.is_empty());
    assert!(basic.len() < standard.len());
    assert!(standard.len() < advanced.len());
    assert_eq!(advanced.len(), registry.len());
    assert!(
        basic
            .iter()
            .all(|c| c.min_tier() == CertificationTier::Basic)
    );
}

#[test]
fn builtin_suite_has_latency_cases_at_standard() {
    let registry = Registry::global();
    let performance = registry.by_category(Category::Performance);
    assert_eq!(performance.len(), costplug_core::Method::ALL.len());
    assert!(
        performance
            .iter()
            .all(|c| c.min_tier() == CertificationTier::Standard)
    );
    assert!(registry.get("latency_name").is_some());
}

#[test]
fn duplicate_registration_is_rejected_and_ignored() {
    let mut builder = RegistryBuilder::builtin();
    let before = builder.len();
    assert!(
        builder
            .register(case("plugin_name", CertificationTier::Basic))
            .is_err()
    );
    assert_eq!(builder.len(), before);
}
