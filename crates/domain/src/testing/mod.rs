//! Response expectations and their evaluation results.
//!
//! This module provides the types used to describe what a response must
//! look like and to report how a response measured up.

mod pattern;
mod report;

pub use pattern::{JsonPattern, ObjectPattern, RegexLeaf};
pub use report::{AssertionFailure, EvaluationReport, ExpectationResult};

use crate::response::StatusCode;

/// One check run against a response once it exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Status code equals the given value.
    Status(u16),
    /// Body structurally matches a partial JSON pattern.
    JsonLike(JsonPattern),
    /// Header is present, optionally with an exact value.
    Header {
        /// Header name (case-insensitive).
        name: String,
        /// Expected value, if any.
        value: Option<String>,
    },
    /// Body is an array with at least this many elements.
    JsonLengthAtLeast(usize),
}

impl Expectation {
    /// Get a human-readable description of this expectation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Status(code) => format!("status = {}", StatusCode::new(*code)),
            Self::JsonLike(pattern) => format!("body like {pattern}"),
            Self::Header {
                name,
                value: Some(v),
            } => format!("header '{name}' = '{v}'"),
            Self::Header { name, value: None } => format!("header '{name}' exists"),
            Self::JsonLengthAtLeast(min) => format!("body length >= {min}"),
        }
    }
}
