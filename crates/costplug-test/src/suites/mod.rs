//! Built-in conformance suite.
//!
//! | Category | Minimum tier |
//! |----------|--------------|
//! | Functional | Basic |
//! | Consistency | Standard |
//! | Performance | Standard |
//! | Concurrency | Standard (single method), Advanced (mixed) |

use costplug_core::{ContractError, Method, ResourceDescriptor};

use crate::error::TestFailure;
use crate::registry::TestCase;

/// Registers an `async fn(&TestContext<'_>) -> CaseResult` under its own name.
macro_rules! case {
    ($body:ident, $category:ident, $tier:ident, $description:expr) => {
        $crate::registry::TestCase::new(
            stringify!($body),
            $crate::registry::Category::$category,
            $crate::tier::CertificationTier::$tier,
            $description,
            |ctx| ::futures::FutureExt::boxed($body(ctx)),
        )
    };
}
pub(crate) use case;

mod concurrency;
mod consistency;
mod functional;
mod performance;

/// Every built-in case, in execution order.
pub fn builtin() -> Vec<TestCase> {
    let mut cases = Vec::new();
    cases.extend(functional::cases());
    cases.extend(consistency::cases());
    cases.extend(performance::cases());
    cases.extend(concurrency::cases());
    cases
}

/// A resource every supported provider can price.
pub(crate) fn sample_resource() -> ResourceDescriptor {
    ResourceDescriptor::new("aws", "aws:ec2:Instance", "t3.micro", "us-east-1")
}

pub(crate) fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Passes if `result` is an `InvalidArgument` error.
pub(crate) fn expect_invalid_argument<T: std::fmt::Debug>(
    method: Method,
    result: Result<T, ContractError>,
) -> Result<String, TestFailure> {
    match result {
        Err(ContractError::InvalidArgument(msg)) => Ok(format!("{method} rejected: {msg}")),
        Err(other) => Err(TestFailure::call(method, other)),
        Ok(resp) => Err(TestFailure::assertion(format!(
            "{method} accepted an invalid request: {resp:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_unique() {
        let cases = builtin();
        let names: HashSet<_> = cases.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names.len(), cases.len());
    }

    #[test]
    fn test_latency_case_per_method() {
        let cases = builtin();
        for method in Method::ALL {
            let found = cases
                .iter()
                .any(|c| c.name().starts_with("latency_") && c.description().contains(method.as_str()));
            assert!(found, "no latency case for {method}");
        }
    }

    #[test]
    fn test_currency_code() {
        assert!(is_currency_code("USD"));
        assert!(!is_currency_code("usd"));
        assert!(!is_currency_code("US"));
    }

    #[test]
    fn test_expect_invalid_argument() {
        assert!(
            expect_invalid_argument::<()>(Method::Supports, Err(ContractError::invalid_argument("x")))
                .is_ok()
        );
        assert!(expect_invalid_argument(Method::Supports, Ok(())).is_err());
        assert!(
            expect_invalid_argument::<()>(Method::Supports, Err(ContractError::internal("x")))
                .is_err()
        );
    }
}
