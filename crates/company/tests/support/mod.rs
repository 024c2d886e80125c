//! In-process stand-in for the company registry service.
//!
//! Mirrors the observable contract of the live service: validation order
//! and messages, CNPJ uniqueness, 404 for unknown ids and 405 for PATCH.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vouch_company::Company;
use vouch_company::model::messages;

#[derive(Debug)]
struct Registry {
    next_id: u64,
    companies: BTreeMap<u64, Company>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            next_id: 1,
            companies: BTreeMap::new(),
        }
    }
}

impl Registry {
    fn cnpj_taken(&self, cnpj: &str, except: Option<u64>) -> bool {
        self.companies
            .values()
            .any(|c| c.cnpj == cnpj && Some(c.id) != except)
    }
}

type Shared = Arc<Mutex<Registry>>;

/// Handle to a running stub. The server stops when this is dropped.
pub struct StubService {
    base_url: String,
    registry: Shared,
    server: JoinHandle<()>,
}

impl StubService {
    /// Binds to an ephemeral local port and starts serving.
    pub async fn spawn() -> Self {
        let registry = Shared::default();
        let app = Router::new()
            .route("/company", get(list).post(create))
            .route("/company/{id}", get(find).put(update).delete(remove))
            .with_state(Arc::clone(&registry));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            registry,
            server,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores `company` under its own id, as if created earlier.
    pub fn seed(&self, company: Company) {
        let mut registry = self.registry.lock().unwrap();
        registry.next_id = registry.next_id.max(company.id + 1);
        registry.companies.insert(company.id, company);
    }

    pub fn companies(&self) -> Vec<Company> {
        self.registry.lock().unwrap().companies.values().cloned().collect()
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn text(body: &Value, field: &str) -> Option<String> {
    body.get(field).map(|v| match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Error messages for `body`, in the order the service reports them.
/// A partial body (update) only has its present fields checked.
fn validate(body: &Value, partial: bool) -> Vec<&'static str> {
    let mut errors = Vec::new();

    match text(body, "cnpj") {
        Some(cnpj) => {
            if !cnpj.chars().all(|c| c.is_ascii_digit()) {
                errors.push(messages::CNPJ_DIGITS_ONLY);
            }
            if cnpj.chars().count() != 14 {
                errors.push(messages::CNPJ_LENGTH);
            }
        }
        None if !partial => errors.push(messages::CNPJ_LENGTH),
        None => {}
    }

    for (field, message) in [
        ("state", messages::STATE_REQUIRED),
        ("sector", messages::SECTOR_REQUIRED),
    ] {
        if text(body, field).map_or(!partial, |v| v.trim().is_empty()) {
            errors.push(message);
        }
    }

    errors
}

fn rejected(errors: &[&str]) -> Response {
    let errors: Vec<Value> = errors.iter().map(|msg| json!({ "msg": msg })).collect();
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": messages::NOT_FOUND }))).into_response()
}

async fn list(State(registry): State<Shared>) -> Response {
    let companies: Vec<Company> = registry.lock().unwrap().companies.values().cloned().collect();
    Json(companies).into_response()
}

async fn create(State(registry): State<Shared>, Json(body): Json<Value>) -> Response {
    let errors = validate(&body, false);
    if !errors.is_empty() {
        return rejected(&errors);
    }

    let mut registry = registry.lock().unwrap();
    let cnpj = text(&body, "cnpj").unwrap_or_default();
    if registry.cnpj_taken(&cnpj, None) {
        return rejected(&[messages::CNPJ_TAKEN]);
    }

    let field = |name| text(&body, name).unwrap_or_default();
    let company = Company {
        id: registry.next_id,
        name: field("name"),
        address: field("address"),
        city: field("city"),
        state: field("state"),
        country: field("country"),
        sector: field("sector"),
        cnpj,
    };
    registry.next_id += 1;
    registry.companies.insert(company.id, company.clone());

    (StatusCode::CREATED, Json(company)).into_response()
}

async fn find(State(registry): State<Shared>, Path(id): Path<u64>) -> Response {
    match registry.lock().unwrap().companies.get(&id) {
        Some(company) => Json(company.clone()).into_response(),
        None => not_found(),
    }
}

async fn update(
    State(registry): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let errors = validate(&body, true);
    if !errors.is_empty() {
        return rejected(&errors);
    }

    let mut registry = registry.lock().unwrap();
    if !registry.companies.contains_key(&id) {
        return not_found();
    }
    if let Some(cnpj) = text(&body, "cnpj")
        && registry.cnpj_taken(&cnpj, Some(id))
    {
        return rejected(&[messages::CNPJ_TAKEN]);
    }

    let Some(company) = registry.companies.get_mut(&id) else {
        return not_found();
    };
    for (name, slot) in [
        ("name", &mut company.name),
        ("address", &mut company.address),
        ("city", &mut company.city),
        ("state", &mut company.state),
        ("country", &mut company.country),
        ("sector", &mut company.sector),
        ("cnpj", &mut company.cnpj),
    ] {
        if let Some(value) = text(&body, name) {
            *slot = value;
        }
    }

    Json(json!({ "message": messages::UPDATED, "company": company })).into_response()
}

async fn remove(State(registry): State<Shared>, Path(id): Path<u64>) -> Response {
    match registry.lock().unwrap().companies.remove(&id) {
        Some(_) => Json(json!({ "message": messages::DELETED })).into_response(),
        None => not_found(),
    }
}
