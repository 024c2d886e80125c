//! Application error types

use thiserror::Error;
use vouch_domain::{ConfigurationError, EvaluationReport};

use crate::ports::TransportError;

/// Every way a contract test case can fail.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The request or an expectation was malformed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// No response could be obtained.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response was obtained but at least one expectation failed.
    #[error("assertion failed: {0}")]
    Assertion(EvaluationReport),

    /// The dispatch was cancelled before a response arrived.
    #[error("dispatch cancelled")]
    Cancelled,

    /// A later step asked for a value no earlier step captured.
    #[error("no value captured under '{0}'")]
    MissingCapture(String),

    /// A captured value could not be read as the requested type.
    #[error("captured value '{key}' has an unexpected shape: {reason}")]
    InvalidCapture {
        /// Capture key.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

impl ApplicationError {
    /// Returns the evaluation report if this is an assertion failure.
    #[must_use]
    pub const fn report(&self) -> Option<&EvaluationReport> {
        match self {
            Self::Assertion(report) => Some(report),
            _ => None,
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
