//! HTTP client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port. It owns connection
//! pooling, TLS and redirects, and turns every reqwest failure into a
//! `TransportError` the application layer can reason about.

use std::collections::HashMap;
use std::error::Error as _;
use std::io;
use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use vouch_application::ports::{ExecuteFuture, HttpClient, TransportError};
use vouch_domain::request::{HttpMethod, RequestDescriptor};
use vouch_domain::response::ResponseRecord;

use crate::config::HarnessConfig;

/// Maximum redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("vouch/", env!("CARGO_PKG_VERSION"));

/// HTTP client backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Creates a client from loaded harness settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, TransportError> {
        Self::with_user_agent(&config.user_agent)
    }

    fn with_user_agent(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    fn map_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        let host = error
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown")
            .to_string();

        if error.is_redirect() {
            return TransportError::TooManyRedirects { max: MAX_REDIRECTS };
        }

        if error.is_connect() {
            if io_error_kind(error) == Some(io::ErrorKind::ConnectionRefused) {
                return TransportError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }

            let message = error_chain(error);
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") || lower.contains("lookup") {
                return TransportError::DnsError { host, message };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_body() || error.is_decode() {
            return TransportError::Body(error_chain(error));
        }

        TransportError::Other(error_chain(error))
    }
}

/// Joins an error and all of its sources into one line.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Finds the I/O error kind buried in the source chain, if any.
fn io_error_kind(error: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
        source = cause.source();
    }
    None
}

/// Folds response headers into a map keyed by lowercase name.
/// Repeated headers are joined with `, `.
fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: &RequestDescriptor, timeout: Duration) -> ExecuteFuture<'_> {
        let method = request.method();
        let url = request.url().clone();
        let headers: Vec<_> = request
            .headers()
            .iter()
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect();
        let body = request.body().cloned();

        Box::pin(async move {
            let start = Instant::now();

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), url)
                .timeout(timeout);

            for (name, value) in &headers {
                builder = builder.header(name, value);
            }

            // `json` only sets Content-Type when the caller has not.
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout))?;

            let status = response.status().as_u16();
            let response_headers = collect_headers(response.headers());

            let bytes = response
                .bytes()
                .await
                .map_err(|e| Self::map_error(&e, timeout))?;

            let duration = start.elapsed();
            tracing::trace!(status, bytes = bytes.len(), "response body read");

            Ok(ResponseRecord::new(
                status,
                response_headers,
                &bytes,
                duration,
            ))
        })
    }
}
