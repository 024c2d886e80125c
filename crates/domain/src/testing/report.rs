//! Per-expectation outcomes and the report collecting them.

use std::fmt;

use super::Expectation;

/// Why a single expectation did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    /// Where the divergence was found (`status`, `headers.etag`, `$.errors[0].msg`).
    pub path: String,
    /// What the expectation required.
    pub expected: String,
    /// What the response contained.
    pub actual: String,
}

impl AssertionFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Result of running a single expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectationResult {
    /// The expectation that was run.
    pub expectation: Expectation,
    /// Failure details, `None` when it passed.
    pub failure: Option<AssertionFailure>,
}

impl ExpectationResult {
    /// Create a passed result.
    #[must_use]
    pub const fn pass(expectation: Expectation) -> Self {
        Self {
            expectation,
            failure: None,
        }
    }

    /// Create a failed result.
    #[must_use]
    pub const fn fail(expectation: Expectation, failure: AssertionFailure) -> Self {
        Self {
            expectation,
            failure: Some(failure),
        }
    }

    /// Whether the expectation held.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of evaluating every expectation of one test case.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Individual results, in declaration order.
    pub results: Vec<ExpectationResult>,
    /// Total number of expectations.
    pub total: usize,
    /// Number of passed expectations.
    pub passed: usize,
    /// Number of failed expectations.
    pub failed: usize,
}

impl EvaluationReport {
    /// Create a report from individual results.
    #[must_use]
    pub fn new(results: Vec<ExpectationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed()).count();

        Self {
            results,
            total,
            passed,
            failed: total - passed,
        }
    }

    /// Check if all expectations passed. An empty report passes.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Iterates over the failed results only.
    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} expectations failed", self.failed, self.total)?;
        for result in self.failures() {
            if let Some(failure) = &result.failure {
                write!(f, "\n  - {}: {failure}", result.expectation.description())?;
            }
        }
        Ok(())
    }
}
