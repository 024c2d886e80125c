//! Request descriptor and its builder

use std::time::Duration;

use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::{Header, Headers, HttpMethod};
use crate::error::{ConfigurationError, DomainResult};

/// Complete, validated definition of one HTTP call.
///
/// Only [`RequestBuilder::build`] produces a descriptor, so every value of
/// this type has a method, an absolute http(s) URL and a body compatible
/// with its method. Fields are read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    id: Uuid,
    method: HttpMethod,
    url: Url,
    headers: Headers,
    body: Option<serde_json::Value>,
    timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Identifier used to correlate log events for this request.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Target URL, including any query parameters.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// JSON body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Per-request timeout override.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Accumulates method, URL, headers and body for one HTTP call.
///
/// Chained calls never fail. The first problem is remembered and reported
/// by [`build`](Self::build), which keeps the chain readable while still
/// rejecting malformed descriptors before anything is sent.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    target: Option<(HttpMethod, String)>,
    headers: Headers,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    timeout: Option<Duration>,
    error: Option<ConfigurationError>,
}

impl RequestBuilder {
    /// Sets method and URL. Setting them twice is a configuration error.
    #[must_use]
    pub fn method(mut self, method: HttpMethod, url: impl Into<String>) -> Self {
        if let Some(first) = self.target.as_ref().map(|(m, _)| *m) {
            self.record(ConfigurationError::MethodAlreadySet {
                first,
                second: method,
            });
        } else {
            self.target = Some((method, url.into()));
        }
        self
    }

    /// Describes a GET request.
    #[must_use]
    pub fn get(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Get, url)
    }

    /// Describes a POST request.
    #[must_use]
    pub fn post(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Post, url)
    }

    /// Describes a PUT request.
    #[must_use]
    pub fn put(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Put, url)
    }

    /// Describes a DELETE request.
    #[must_use]
    pub fn delete(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Delete, url)
    }

    /// Describes a PATCH request.
    #[must_use]
    pub fn patch(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Patch, url)
    }

    /// Describes a HEAD request.
    #[must_use]
    pub fn head(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Head, url)
    }

    /// Describes an OPTIONS request.
    #[must_use]
    pub fn options(self, url: impl Into<String>) -> Self {
        self.method(HttpMethod::Options, url)
    }

    /// Attaches a JSON body.
    ///
    /// Whether the method accepts a body is checked at build time, so this
    /// may be called before or after the method setter.
    #[must_use]
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(e) => self.record(ConfigurationError::InvalidBody(e.to_string())),
        }
        self
    }

    /// Merges a single header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        match Header::try_new(name, value) {
            Ok(header) => self.headers.merge(header),
            Err(e) => self.record(e),
        }
        self
    }

    /// Merges several headers; later names replace earlier ones.
    #[must_use]
    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.with_header(name, value))
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Overrides the dispatcher timeout for this request only.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validates the accumulated state and produces an immutable descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while chaining, or `MissingMethod`,
    /// `InvalidUrl` or `BodyNotAllowed` when the final state is inconsistent.
    pub fn build(self) -> DomainResult<RequestDescriptor> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let (method, raw_url) = self.target.ok_or(ConfigurationError::MissingMethod)?;
        let mut url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigurationError::InvalidUrl(format!("{e}: {raw_url}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidUrl(format!(
                "URL must start with http:// or https://: {raw_url}"
            )));
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        if self.body.is_some() && !method.accepts_body() {
            return Err(ConfigurationError::BodyNotAllowed(method));
        }

        Ok(RequestDescriptor {
            id: Uuid::now_v7(),
            method,
            url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        })
    }

    fn record(&mut self, error: ConfigurationError) {
        self.error.get_or_insert(error);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_request() {
        let req = RequestDescriptor::builder()
            .get("https://api.example.com/company")
            .build()
            .unwrap();
        assert_eq!(req.method(), HttpMethod::Get);
        assert_eq!(req.url().as_str(), "https://api.example.com/company");
        assert!(req.body().is_none());
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_post_with_json() {
        let req = RequestDescriptor::builder()
            .post("https://api.example.com/company")
            .with_json(&json!({"name": "Empresa y"}))
            .build()
            .unwrap();
        assert_eq!(req.body(), Some(&json!({"name": "Empresa y"})));
    }

    #[test]
    fn test_json_before_method_is_accepted() {
        let req = RequestDescriptor::builder()
            .with_json(&json!({"name": "x"}))
            .put("https://api.example.com/company/1")
            .build();
        assert!(req.is_ok());
    }

    #[test]
    fn test_missing_method() {
        let result = RequestDescriptor::builder()
            .with_header("Accept", "application/json")
            .build();
        assert_eq!(result, Err(ConfigurationError::MissingMethod));
    }

    #[test]
    fn test_method_set_twice() {
        let result = RequestDescriptor::builder()
            .get("https://api.example.com/a")
            .delete("https://api.example.com/b")
            .build();
        assert_eq!(
            result,
            Err(ConfigurationError::MethodAlreadySet {
                first: HttpMethod::Get,
                second: HttpMethod::Delete,
            })
        );
    }

    #[test]
    fn test_body_not_allowed_on_get() {
        let result = RequestDescriptor::builder()
            .get("https://api.example.com/company")
            .with_json(&json!({}))
            .build();
        assert_eq!(
            result,
            Err(ConfigurationError::BodyNotAllowed(HttpMethod::Get))
        );
    }

    #[test]
    fn test_invalid_url() {
        let result = RequestDescriptor::builder().get("not-a-valid-url").build();
        assert!(matches!(result, Err(ConfigurationError::InvalidUrl(_))));

        let result = RequestDescriptor::builder()
            .get("ftp://files.example.com/x")
            .build();
        assert!(matches!(result, Err(ConfigurationError::InvalidUrl(_))));
    }

    #[test]
    fn test_headers_merge() {
        let req = RequestDescriptor::builder()
            .get("https://api.example.com")
            .with_headers([("Accept", "text/plain"), ("X-Tenant", "a")])
            .with_headers([("accept", "application/json")])
            .build()
            .unwrap();
        assert_eq!(req.headers().len(), 2);
        assert_eq!(req.headers().get("Accept"), Some("application/json"));
    }

    #[test]
    fn test_first_error_wins() {
        let result = RequestDescriptor::builder()
            .with_header("bad name", "x")
            .get("https://api.example.com")
            .post("https://api.example.com")
            .build();
        assert_eq!(
            result,
            Err(ConfigurationError::InvalidHeaderName("bad name".to_string()))
        );
    }

    #[test]
    fn test_query_params() {
        let req = RequestDescriptor::builder()
            .get("https://api.example.com/company")
            .with_query_param("page", 2)
            .with_query_param("sector", "Tecnologia e Informatica")
            .build()
            .unwrap();
        assert_eq!(
            req.url().as_str(),
            "https://api.example.com/company?page=2&sector=Tecnologia+e+Informatica"
        );
    }

    #[test]
    fn test_timeout_override() {
        let req = RequestDescriptor::builder()
            .delete("https://api.example.com/company/1")
            .with_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        assert_eq!(req.timeout(), Some(Duration::from_secs(2)));
    }
}
