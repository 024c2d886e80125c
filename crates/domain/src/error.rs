//! Domain error types

use thiserror::Error;

use crate::request::HttpMethod;

/// Errors raised while describing a request or an expectation.
///
/// These are usage errors: the contract was malformed before anything was
/// sent over the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No HTTP method (and therefore no URL) was set on the descriptor.
    #[error("no HTTP method set on the request descriptor")]
    MissingMethod,

    /// A method setter was called more than once.
    #[error("HTTP method already set to {first}, refusing to switch to {second}")]
    MethodAlreadySet {
        /// The method set first.
        first: HttpMethod,
        /// The method the caller attempted to set afterwards.
        second: HttpMethod,
    },

    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A body was attached to a method that does not carry one.
    #[error("{0} requests do not accept a body")]
    BodyNotAllowed(HttpMethod),

    /// The body could not be serialized as JSON.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A header name is not a valid HTTP token.
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// A header value contains control characters.
    #[error("invalid header value for {name}: {value:?}")]
    InvalidHeaderValue {
        /// Header name.
        name: String,
        /// Offending value.
        value: String,
    },

    /// A regex leaf in a JSON pattern failed to compile.
    #[error("invalid pattern /{pattern}/: {reason}")]
    InvalidPattern {
        /// Pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, ConfigurationError>;
