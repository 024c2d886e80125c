//! Integration tests for the reqwest adapter against a local axum server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use vouch_application::ports::{HttpClient, TransportError};
use vouch_domain::request::RequestDescriptor;
use vouch_infrastructure::{ReqwestHttpClient, init_tracing};

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn echo(State(seen): State<Seen>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    seen.requests.lock().unwrap().push((content_type, value.clone()));
    (StatusCode::CREATED, Json(json!({"id": 7, "echo": value})))
}

async fn plain_text() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

async fn spawn_server(seen: Seen) -> SocketAddr {
    let app = Router::new()
        .route("/company", post(echo))
        .route("/text", get(plain_text))
        .route("/slow", get(slow))
        .with_state(seen);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

#[tokio::test]
async fn test_post_json_roundtrip() {
    init_tracing();
    let seen = Seen::default();
    let addr = spawn_server(seen.clone()).await;
    let client = ReqwestHttpClient::new().unwrap();

    let request = RequestDescriptor::builder()
        .post(format!("http://{addr}/company"))
        .with_json(&json!({"name": "Empresa y", "cnpj": "12344558000145"}))
        .build()
        .unwrap();

    let response = client
        .execute(&request, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.pointer("/id"), Some(&json!(7)));
    assert_eq!(response.pointer("/echo/name"), Some(&json!("Empresa y")));
    assert!(response.is_json());

    let requests = seen.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_explicit_content_type_is_kept() {
    let seen = Seen::default();
    let addr = spawn_server(seen.clone()).await;
    let client = ReqwestHttpClient::new().unwrap();

    let request = RequestDescriptor::builder()
        .post(format!("http://{addr}/company"))
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_json(&json!({}))
        .build()
        .unwrap();
    client.execute(&request, Duration::from_secs(5)).await.unwrap();

    let requests = seen.requests.lock().unwrap().clone();
    assert_eq!(
        requests[0].0.as_deref(),
        Some("application/json; charset=utf-8")
    );
}

#[tokio::test]
async fn test_non_json_body_is_kept_as_text() {
    let addr = spawn_server(Seen::default()).await;
    let client = ReqwestHttpClient::new().unwrap();

    let request = RequestDescriptor::builder()
        .get(format!("http://{addr}/text"))
        .build()
        .unwrap();
    let response = client.execute(&request, Duration::from_secs(5)).await.unwrap();

    assert_eq!(response.status, 405);
    assert_eq!(response.body, json!("Method Not Allowed"));
    assert_eq!(response.text, "Method Not Allowed");
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let addr = spawn_server(Seen::default()).await;
    let client = ReqwestHttpClient::new().unwrap();

    let request = RequestDescriptor::builder()
        .get(format!("http://{addr}/slow"))
        .build()
        .unwrap();
    let err = client
        .execute(&request, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::Timeout { timeout_ms: 100 });
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ReqwestHttpClient::new().unwrap();
    let request = RequestDescriptor::builder()
        .get(format!("http://{addr}/company"))
        .build()
        .unwrap();
    let err = client
        .execute(&request, Duration::from_secs(2))
        .await
        .unwrap_err();

    match err {
        TransportError::ConnectionRefused { host, port } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(port, addr.port());
        }
        TransportError::ConnectionFailed(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}
