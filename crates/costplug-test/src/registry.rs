//! Test case registry.
//!
//! Cases are registered on a [`RegistryBuilder`] during initialization and
//! frozen into a read-only [`Registry`]. Selection by tier preserves
//! registration order and is monotone: a higher tier never selects fewer
//! cases.
//!
//! | Category | Minimum tier | Checks |
//! |----------|--------------|--------|
//! | Functional | Basic | Each method answers with a well-formed response |
//! | Consistency | Standard | Repeated and related calls agree |
//! | Performance | Standard | Average latency within baseline |
//! | Concurrency | Standard/Advanced | Parallel callers are served correctly |

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use futures::future::BoxFuture;

use crate::context::TestContext;
use crate::error::{Result, TestError, TestFailure};
use crate::tier::CertificationTier;

/// Outcome of a case body: details on success, the failure otherwise.
pub type CaseResult = std::result::Result<String, TestFailure>;

/// A case body.
pub type TestFn = for<'a> fn(&'a TestContext<'a>) -> BoxFuture<'a, CaseResult>;

/// Test category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Per-method response shape and validation.
    Functional,
    /// Agreement between repeated or related calls.
    Consistency,
    /// Latency against baselines.
    Performance,
    /// Behaviour under parallel callers.
    Concurrency,
}

impl Category {
    /// Every category.
    pub const ALL: [Self; 4] = [
        Self::Functional,
        Self::Consistency,
        Self::Performance,
        Self::Concurrency,
    ];

    /// Returns the category name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Functional => "Functional",
            Self::Consistency => "Consistency",
            Self::Performance => "Performance",
            Self::Concurrency => "Concurrency",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A registered conformance check.
#[derive(Clone)]
pub struct TestCase {
    name: String,
    description: String,
    category: Category,
    min_tier: CertificationTier,
    run: TestFn,
}

impl TestCase {
    /// Creates a test case.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: Category,
        min_tier: CertificationTier,
        description: impl Into<String>,
        run: TestFn,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
            min_tier,
            run,
        }
    }

    /// Returns the unique case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the lowest tier this case runs at.
    #[must_use]
    pub const fn min_tier(&self) -> CertificationTier {
        self.min_tier
    }

    /// Starts the case body.
    pub fn run<'a>(&self, ctx: &'a TestContext<'a>) -> BoxFuture<'a, CaseResult> {
        (self.run)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("min_tier", &self.min_tier)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) - {}",
            self.min_tier, self.name, self.category, self.description
        )
    }
}

/// Collects cases during initialization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    cases: Vec<TestCase>,
    names: HashSet<String>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pre-loaded with the built-in suite.
    #[must_use]
    pub fn builtin() -> Self {
        let mut builder = Self::new();
        for case in crate::suites::builtin() {
            if let Err(e) = builder.register(case) {
                tracing::error!(error = %e, "skipping built-in case");
            }
        }
        builder
    }

    /// Appends a case.
    ///
    /// # Errors
    /// Returns an error if a case with the same name is already registered.
    pub fn register(&mut self, case: TestCase) -> Result<&mut Self> {
        if !self.names.insert(case.name.clone()) {
            return Err(TestError::registry(format!(
                "duplicate test case name: {}",
                case.name
            )));
        }
        self.cases.push(case);
        Ok(self)
    }

    /// Returns the number of cases registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry { cases: self.cases }
    }
}

/// Read-only, ordered collection of test cases.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    /// Returns the process-wide registry holding the built-in suite.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| RegistryBuilder::builtin().build())
    }

    /// Returns every case eligible at `tier`, in registration order.
    #[must_use]
    pub fn select(&self, tier: CertificationTier) -> Vec<&TestCase> {
        self.cases
            .iter()
            .filter(|c| tier.admits(c.min_tier))
            .collect()
    }

    /// Returns the case named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Returns every case in `category`, in registration order.
    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<&TestCase> {
        self.cases
            .iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Iterates every case in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter()
    }

    /// Returns the number of cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Fails the enclosing case with an assertion failure unless `cond` holds.
#[macro_export]
macro_rules! assert_case {
    ($cond:expr) => {
        if !$cond {
            return Err($crate::TestFailure::assertion(stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::TestFailure::assertion(format!($($arg)+)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use proptest::prelude::*;

    fn pass<'a>(_ctx: &'a TestContext<'a>) -> BoxFuture<'a, CaseResult> {
        async { Ok("ok".to_string()) }.boxed()
    }

    fn case(name: &str, tier: CertificationTier) -> TestCase {
        TestCase::new(name, Category::Functional, tier, "test", pass)
    }

    fn registry_of(tiers: &[CertificationTier]) -> Registry {
        let mut builder = RegistryBuilder::new();
        for (i, tier) in tiers.iter().enumerate() {
            builder.register(case(&format!("case_{i}"), *tier)).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_select_filters_by_tier_in_order() {
        let registry = registry_of(&[
            CertificationTier::Advanced,
            CertificationTier::Basic,
            CertificationTier::Standard,
        ]);

        let names: Vec<_> = registry
            .select(CertificationTier::Standard)
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["case_1", "case_2"]);
        assert_eq!(registry.select(CertificationTier::Basic).len(), 1);
        assert_eq!(registry.select(CertificationTier::Advanced).len(), 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(case("dup", CertificationTier::Basic))
            .unwrap();
        let err = builder
            .register(case("dup", CertificationTier::Advanced))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate test case name: dup"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_register_chains() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(case("a", CertificationTier::Basic))
            .unwrap()
            .register(case("b", CertificationTier::Basic))
            .unwrap();
        assert_eq!(builder.build().len(), 2);
    }

    #[test]
    fn test_get_and_by_category() {
        let registry = registry_of(&[CertificationTier::Basic]);
        assert!(registry.get("case_0").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.by_category(Category::Functional).len(), 1);
        assert!(registry.by_category(Category::Performance).is_empty());
    }

    #[test]
    fn test_global_registry_covers_every_category() {
        let registry = Registry::global();
        assert!(!registry.is_empty());
        for category in Category::ALL {
            assert!(
                !registry.by_category(category).is_empty(),
                "no {category} cases"
            );
        }
        assert!(std::ptr::eq(registry, Registry::global()));
    }

    #[test]
    fn test_case_display() {
        let c = case("plugin_name", CertificationTier::Basic);
        assert_eq!(c.to_string(), "[basic] plugin_name (Functional) - test");
    }

    fn tier() -> impl Strategy<Value = CertificationTier> {
        prop::sample::select(CertificationTier::ALL.to_vec())
    }

    proptest! {
        /// A higher tier never selects fewer cases, and what a lower tier
        /// selects is a prefix-preserving subset.
        #[test]
        fn select_is_monotone(tiers in prop::collection::vec(tier(), 0..32)) {
            let registry = registry_of(&tiers);
            let basic = registry.select(CertificationTier::Basic);
            let standard = registry.select(CertificationTier::Standard);
            let advanced = registry.select(CertificationTier::Advanced);

            prop_assert!(basic.len() <= standard.len());
            prop_assert!(standard.len() <= advanced.len());
            prop_assert_eq!(advanced.len(), tiers.len());

            let standard_names: Vec<_> = standard.iter().map(|c| c.name()).collect();
            let mut it = standard_names.iter();
            for c in &basic {
                prop_assert!(it.any(|n| *n == c.name()));
            }
        }
    }
}
