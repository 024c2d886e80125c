//! Vouch Domain - Core contract-testing types
//!
//! This crate defines the domain model of the harness: request descriptors,
//! response records, JSON patterns and expectation reports.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod request;
pub mod response;
pub mod testing;

pub use error::{ConfigurationError, DomainResult};
pub use request::{Header, Headers, HttpMethod, RequestBuilder, RequestDescriptor};
pub use response::{ResponseRecord, StatusCode};
pub use testing::{
    AssertionFailure, EvaluationReport, Expectation, ExpectationResult, JsonPattern, ObjectPattern,
};
