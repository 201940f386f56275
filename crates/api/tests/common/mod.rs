#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method as HttpMethod, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use invoicer_api::config::{LogFormat, ServerConfig};
use invoicer_api::router::build_app_router;
use invoicer_api::state::AppState;
use invoicer_core::profile::Profile;
use invoicer_inventory::{ApiError, Gateway, Method};

/// Build a test `ServerConfig` with safe defaults.
///
/// Profiles are read from `profiles_path`; the settle delay is zero so jobs
/// finish quickly.
pub fn test_config(profiles_path: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        profiles_path,
        inventory_api_url: "http://127.0.0.1:9".to_string(),
        gateway_timeout_secs: 5,
        settle_delay_ms: 0,
        log_format: LogFormat::Pretty,
    }
}

/// The `Acme` profile used throughout the tests.
pub fn acme() -> Profile {
    serde_json::from_value(serde_json::json!({
        "profileName": "Acme",
        "inventory": { "orgId": "600", "accessToken": "tok" }
    }))
    .unwrap()
}

/// Write `profiles` to a fresh temporary file.
pub fn write_profiles(profiles: &[Profile]) -> PathBuf {
    let path =
        std::env::temp_dir().join(format!("invoicer-api-profiles-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, serde_json::to_vec(profiles).unwrap()).unwrap();
    path
}

/// Build the application state and router with `gateway` and `profiles`.
///
/// Uses [`build_app_router`] so tests exercise the production middleware
/// stack.
pub fn build_test_app(gateway: Arc<dyn Gateway>, profiles: &[Profile]) -> (Router, AppState) {
    let config = test_config(write_profiles(profiles));
    let state = AppState::new(config.clone(), gateway);
    (build_app_router(state.clone(), &config), state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(
    app: Router,
    method: HttpMethod,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// StubInventory
// ---------------------------------------------------------------------------

/// Inventory service where every contact exists and every call succeeds.
///
/// Invoices are numbered `INV-1`, `INV-2`, ...; organization updates echo
/// the submitted `contact_name`.
#[derive(Default)]
pub struct StubInventory {
    latency: Duration,
    invoices: AtomicU32,
}

impl StubInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Gateway for StubInventory {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        _profile: &Profile,
    ) -> Result<serde_json::Value, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let contact = serde_json::json!({
            "contact_id": "c-1",
            "contact_persons": [{ "contact_person_id": "p-1" }]
        });
        match method {
            Method::Get if path.starts_with("/v1/contacts?") => {
                Ok(serde_json::json!({ "code": 0, "contacts": [contact] }))
            }
            Method::Get if path.starts_with("/v1/contacts/") => {
                Ok(serde_json::json!({ "code": 0, "contact": contact }))
            }
            Method::Post if path == "/v1/invoices" => {
                let n = self.invoices.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(serde_json::json!({
                    "code": 0,
                    "invoice": { "invoice_id": format!("inv-{n}"), "invoice_number": format!("INV-{n}") }
                }))
            }
            Method::Post if path.ends_with("/email") => {
                Ok(serde_json::json!({ "code": 0, "message": "Your message has been sent." }))
            }
            Method::Get if path.starts_with("/v1/organizations/") => Ok(serde_json::json!({
                "code": 0,
                "organization": { "name": "Acme Ltd", "contact_name": "Old Name" }
            })),
            Method::Put if path.starts_with("/v1/organizations/") => {
                let name = body
                    .and_then(|b| b.get("contact_name"))
                    .cloned()
                    .unwrap_or_default();
                Ok(serde_json::json!({
                    "code": 0,
                    "organization": { "name": "Acme Ltd", "contact_name": name }
                }))
            }
            _ => Err(ApiError::Api {
                status: 404,
                message: "Unknown endpoint".to_string(),
                body: None,
            }),
        }
    }
}
