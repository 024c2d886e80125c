//! Fluent contract flow.
//!
//! A test case moves through three states, each its own type:
//!
//! - [`ContractSpec`]: describing the request and its expectations
//! - [`Dispatched`]: the request was sent exactly once and a response exists
//! - [`EvaluationReport`]: expectations were checked against that response
//!
//! There is no way to evaluate a `ContractSpec`, and dispatching consumes
//! it, so a descriptor cannot be sent twice.
//!
//! ```ignore
//! let created = spec()
//!     .post(format!("{base}/company"))
//!     .with_json(&company)
//!     .expect_status(201)
//!     .expect_json_like(JsonPattern::object().field("id", JsonPattern::regex(r"\d+")?))
//!     .run(&dispatcher)
//!     .await?;
//! ```

use std::time::Duration;

use serde::Serialize;
use vouch_domain::request::{RequestBuilder, RequestDescriptor};
use vouch_domain::response::ResponseRecord;
use vouch_domain::testing::{EvaluationReport, Expectation, JsonPattern};

use crate::dispatch::Dispatcher;
use crate::evaluator::AssertionEvaluator;
use crate::ports::{CancellationReceiver, HttpClient};
use crate::{ApplicationError, ApplicationResult};

/// Starts an empty contract.
pub fn spec() -> ContractSpec {
    ContractSpec::new()
}

/// A request description plus the expectations its response must meet.
#[derive(Debug, Clone, Default)]
#[must_use = "a contract does nothing until it is dispatched"]
pub struct ContractSpec {
    request: RequestBuilder,
    expectations: Vec<Expectation>,
}

impl ContractSpec {
    /// Creates an empty contract.
    pub fn new() -> Self {
        Self::default()
    }

    fn map_request(mut self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        self.request = f(self.request);
        self
    }

    /// GET `url`.
    pub fn get(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.get(url))
    }

    /// POST `url`.
    pub fn post(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.post(url))
    }

    /// PUT `url`.
    pub fn put(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.put(url))
    }

    /// DELETE `url`.
    pub fn delete(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.delete(url))
    }

    /// PATCH `url`.
    pub fn patch(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.patch(url))
    }

    /// HEAD `url`.
    pub fn head(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.head(url))
    }

    /// OPTIONS `url`.
    pub fn options(self, url: impl Into<String>) -> Self {
        self.map_request(|r| r.options(url))
    }

    /// Attaches a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.map_request(|r| r.with_json(body))
    }

    /// Merges one header.
    pub fn with_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map_request(|r| r.with_header(name, value))
    }

    /// Merges several headers.
    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.map_request(|r| r.with_headers(headers))
    }

    /// Appends a query parameter.
    pub fn with_query_param(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.map_request(|r| r.with_query_param(key, value))
    }

    /// Overrides the dispatcher timeout for this request.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.map_request(|r| r.with_timeout(timeout))
    }

    /// Adds an expectation.
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    /// Expects an exact status code.
    pub fn expect_status(self, code: u16) -> Self {
        self.expect(Expectation::Status(code))
    }

    /// Expects the body to partially match `pattern`.
    pub fn expect_json_like(self, pattern: impl Into<JsonPattern>) -> Self {
        self.expect(Expectation::JsonLike(pattern.into()))
    }

    /// Expects a header, optionally with an exact value.
    pub fn expect_header(self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.expect(Expectation::Header {
            name: name.into(),
            value: value.map(str::to_string),
        })
    }

    /// Expects the body to be an array with at least `min` elements.
    pub fn expect_json_length_at_least(self, min: usize) -> Self {
        self.expect(Expectation::JsonLengthAtLeast(min))
    }

    /// Expectations declared so far.
    #[must_use]
    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    /// Builds the descriptor and sends it once.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the descriptor is malformed (nothing is
    /// sent), or `Transport` if no response was obtained.
    pub async fn dispatch<C: HttpClient>(
        self,
        dispatcher: &Dispatcher<C>,
    ) -> ApplicationResult<Dispatched> {
        let descriptor = self.request.build()?;
        let response = dispatcher.dispatch(&descriptor).await?;
        Ok(Dispatched {
            descriptor,
            expectations: self.expectations,
            response,
        })
    }

    /// Like [`dispatch`](Self::dispatch), abandoning the request on cancel.
    ///
    /// # Errors
    ///
    /// Additionally returns `Cancelled`.
    pub async fn dispatch_with_cancellation<C: HttpClient>(
        self,
        dispatcher: &Dispatcher<C>,
        cancel: CancellationReceiver,
    ) -> ApplicationResult<Dispatched> {
        let descriptor = self.request.build()?;
        let response = dispatcher
            .dispatch_with_cancellation(&descriptor, cancel)
            .await?;
        Ok(Dispatched {
            descriptor,
            expectations: self.expectations,
            response,
        })
    }

    /// Dispatches, evaluates and returns the response if every expectation
    /// held.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error, or `Assertion` with the full report.
    pub async fn run<C: HttpClient>(
        self,
        dispatcher: &Dispatcher<C>,
    ) -> ApplicationResult<ResponseRecord> {
        self.dispatch(dispatcher).await?.verify()
    }
}

/// A contract whose request was sent and answered.
#[derive(Debug, Clone)]
pub struct Dispatched {
    descriptor: RequestDescriptor,
    expectations: Vec<Expectation>,
    response: ResponseRecord,
}

impl Dispatched {
    /// The request that was sent.
    #[must_use]
    pub const fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// The response received.
    #[must_use]
    pub const fn response(&self) -> &ResponseRecord {
        &self.response
    }

    /// Evaluates every expectation. Calling this repeatedly yields the same
    /// report.
    #[must_use]
    pub fn evaluate(&self) -> EvaluationReport {
        AssertionEvaluator::new().evaluate(&self.expectations, &self.response)
    }

    /// Evaluates and hands back the response when everything passed.
    ///
    /// # Errors
    ///
    /// Returns `Assertion` carrying the report when any expectation failed.
    pub fn verify(self) -> ApplicationResult<ResponseRecord> {
        let report = self.evaluate();
        if report.all_passed() {
            Ok(self.response)
        } else {
            tracing::warn!(
                request_id = %self.descriptor.id(),
                method = %self.descriptor.method(),
                url = %self.descriptor.url(),
                failed = report.failed,
                total = report.total,
                "contract violated"
            );
            Err(ApplicationError::Assertion(report))
        }
    }

    /// Drops the expectations and keeps the response.
    #[must_use]
    pub fn into_response(self) -> ResponseRecord {
        self.response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::{CancellationToken, ExecuteFuture, TransportError};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use vouch_domain::{ConfigurationError, HttpMethod};

    /// Replies with a fixed response and records what it was asked to send.
    struct RecordingClient {
        status: u16,
        body: String,
        sent: Mutex<Vec<RequestDescriptor>>,
    }

    impl RecordingClient {
        fn new(status: u16, body: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<RequestDescriptor> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl HttpClient for RecordingClient {
        fn execute(&self, request: &RequestDescriptor, _timeout: Duration) -> ExecuteFuture<'_> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(request.clone());
            }
            let response = ResponseRecord::new(
                self.status,
                HashMap::new(),
                self.body.as_bytes(),
                Duration::from_millis(5),
            );
            Box::pin(async move { Ok::<_, TransportError>(response) })
        }
    }

    /// Client whose requests never complete.
    struct PendingHttpClient;

    impl HttpClient for PendingHttpClient {
        fn execute(&self, _request: &RequestDescriptor, _timeout: Duration) -> ExecuteFuture<'_> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test]
    async fn test_run_returns_response_on_success() {
        let client = RecordingClient::new(201, json!({"id": 10, "name": "Empresa y"}));
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        let response = spec()
            .post("https://api.example.com/company")
            .with_json(&json!({"name": "Empresa y"}))
            .expect_status(201)
            .expect_json_like(
                JsonPattern::object()
                    .field("id", JsonPattern::regex(r"\d+").unwrap())
                    .field("name", "Empresa y"),
            )
            .run(&dispatcher)
            .await
            .unwrap();

        assert_eq!(response.pointer("/id"), Some(&json!(10)));
        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method(), HttpMethod::Post);
        assert_eq!(sent[0].body(), Some(&json!({"name": "Empresa y"})));
    }

    #[tokio::test]
    async fn test_run_collects_all_failures() {
        let client = RecordingClient::new(400, json!({"errors": [{"msg": "x"}]}));
        let dispatcher = Dispatcher::new(client);

        let err = spec()
            .post("https://api.example.com/company")
            .with_json(&json!({}))
            .expect_status(201)
            .expect_json_like(json!({"errors": [{"msg": "x"}]}))
            .expect_json_like(json!({"id": 1}))
            .run(&dispatcher)
            .await
            .unwrap_err();

        let report = err.report().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn test_malformed_contract_is_never_sent() {
        let client = RecordingClient::new(200, json!({}));
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        let err = spec()
            .get("https://api.example.com/company")
            .with_json(&json!({"name": "x"}))
            .expect_status(200)
            .run(&dispatcher)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Configuration(ConfigurationError::BodyNotAllowed(HttpMethod::Get))
        ));
        assert!(client.sent().is_empty());

        let err = spec().expect_status(200).run(&dispatcher).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Configuration(ConfigurationError::MissingMethod)
        ));
    }

    #[tokio::test]
    async fn test_dispatched_evaluation_is_repeatable() {
        let client = RecordingClient::new(404, json!({"message": "Empresa não encontrada"}));
        let dispatcher = Dispatcher::new(client);

        let dispatched = spec()
            .get("https://api.example.com/company/9999")
            .expect_status(404)
            .dispatch(&dispatcher)
            .await
            .unwrap();

        let first = dispatched.evaluate();
        let second = dispatched.evaluate();
        assert!(first.all_passed());
        assert_eq!(first, second);
        assert_eq!(dispatched.descriptor().url().path(), "/company/9999");
        assert_eq!(dispatched.verify().unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_headers_and_query_reach_the_client() {
        let client = RecordingClient::new(200, json!([]));
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        spec()
            .get("https://api.example.com/company")
            .with_headers([("Accept", "application/json")])
            .with_header("X-Request-Source", "contract-suite")
            .with_query_param("limit", 5)
            .expect_status(200)
            .expect_json_like(json!([]))
            .run(&dispatcher)
            .await
            .unwrap();

        let sent = client.sent();
        assert_eq!(sent[0].headers().get("accept"), Some("application/json"));
        assert_eq!(sent[0].url().query(), Some("limit=5"));
    }

    #[test]
    fn test_expectations_are_kept_in_order() {
        let contract = spec()
            .patch("https://api.example.com/company")
            .expect_status(405)
            .expect_header("Allow", None);
        assert_eq!(
            contract.expectations(),
            &[
                Expectation::Status(405),
                Expectation::Header {
                    name: "Allow".to_string(),
                    value: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_contract_yields_no_response() {
        let dispatcher = Dispatcher::new(Arc::new(PendingHttpClient));
        let token = CancellationToken::new();
        let receiver = token.receiver();

        let handle = tokio::spawn(async move {
            spec()
                .get("https://api.example.com/company")
                .expect_status(200)
                .dispatch_with_cancellation(&dispatcher, receiver)
                .await
        });
        token.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ApplicationError::Cancelled)));
    }

    #[tokio::test]
    async fn test_into_response_skips_evaluation() {
        let client = RecordingClient::new(500, json!({"message": "boom"}));
        let dispatcher = Dispatcher::new(Arc::clone(&client));
        let token = CancellationToken::new();

        let dispatched = spec()
            .delete("https://api.example.com/company/1")
            .expect_status(200)
            .dispatch_with_cancellation(&dispatcher, token.receiver())
            .await
            .unwrap();

        assert!(!dispatched.evaluate().all_passed());
        let response = dispatched.into_response();
        assert_eq!(response.status, 500);
        assert_eq!(response.pointer("/message"), Some(&json!("boom")));
        assert_eq!(client.sent().len(), 1);
    }
}
