//! Assertion evaluator.
//!
//! Runs expectations against a response record and produces an evaluation
//! report. Every expectation is evaluated, even after a failure.

use vouch_domain::response::{ResponseRecord, StatusCode};
use vouch_domain::testing::{
    AssertionFailure, EvaluationReport, Expectation, ExpectationResult, JsonPattern,
};

/// Evaluator that checks expectations against responses.
///
/// Evaluation is pure: the same response and expectations always produce
/// the same report.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssertionEvaluator;

impl AssertionEvaluator {
    /// Create a new evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate every expectation against a response.
    #[must_use]
    pub fn evaluate(
        &self,
        expectations: &[Expectation],
        response: &ResponseRecord,
    ) -> EvaluationReport {
        let results = expectations
            .iter()
            .map(|expectation| self.check(expectation, response))
            .collect();
        let report = EvaluationReport::new(results);

        for result in report.failures() {
            if let Some(failure) = &result.failure {
                tracing::debug!(
                    expectation = %result.expectation.description(),
                    path = %failure.path,
                    expected = %failure.expected,
                    actual = %failure.actual,
                    "expectation failed"
                );
            }
        }

        report
    }

    /// Evaluate a single expectation.
    #[must_use]
    pub fn check(&self, expectation: &Expectation, response: &ResponseRecord) -> ExpectationResult {
        let outcome = match expectation {
            Expectation::Status(expected) => Self::check_status(response, *expected),
            Expectation::JsonLike(pattern) => Self::check_json_like(response, pattern),
            Expectation::Header { name, value } => {
                Self::check_header(response, name, value.as_deref())
            }
            Expectation::JsonLengthAtLeast(min) => Self::check_json_length(response, *min),
        };

        match outcome {
            Ok(()) => ExpectationResult::pass(expectation.clone()),
            Err(failure) => ExpectationResult::fail(expectation.clone(), failure),
        }
    }

    fn check_status(response: &ResponseRecord, expected: u16) -> Result<(), AssertionFailure> {
        if response.status == expected {
            Ok(())
        } else {
            Err(AssertionFailure::new(
                "status",
                StatusCode::new(expected).to_string(),
                response.status_code().to_string(),
            ))
        }
    }

    fn check_json_like(
        response: &ResponseRecord,
        pattern: &JsonPattern,
    ) -> Result<(), AssertionFailure> {
        pattern.match_value(&response.body)
    }

    fn check_header(
        response: &ResponseRecord,
        name: &str,
        expected: Option<&str>,
    ) -> Result<(), AssertionFailure> {
        let path = format!("headers.{}", name.to_ascii_lowercase());
        match (response.get_header(name), expected) {
            (None, expected) => Err(AssertionFailure::new(
                path,
                expected.map_or_else(|| "present".to_string(), |v| format!("'{v}'")),
                "missing",
            )),
            (Some(actual), Some(expected)) if actual != expected => Err(AssertionFailure::new(
                path,
                format!("'{expected}'"),
                format!("'{actual}'"),
            )),
            (Some(_), _) => Ok(()),
        }
    }

    fn check_json_length(response: &ResponseRecord, min: usize) -> Result<(), AssertionFailure> {
        let expected = format!("an array of at least {min} elements");
        match &response.body {
            serde_json::Value::Array(items) if items.len() >= min => Ok(()),
            serde_json::Value::Array(items) => Err(AssertionFailure::new(
                "$",
                expected,
                format!("{} elements", items.len()),
            )),
            _ => Err(AssertionFailure::new("$", expected, "not an array")),
        }
    }
}
