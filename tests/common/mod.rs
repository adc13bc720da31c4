//! Shared utilities for integration tests.

#![allow(dead_code)]

use accounting_gateway::config::GatewayConfig;
use accounting_gateway::http::{build_router, AppState, HttpServer};
use accounting_gateway::ledger::{EmptyLedger, LedgerSource};
use accounting_gateway::lifecycle::Shutdown;
use accounting_gateway::settings::{MemorySettingsStore, SettingsStore, COMPANY_RUT};
use accounting_gateway::storage::LogoStorage;
use accounting_gateway::upstream::UpstreamAccountingClient;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const RUT: &str = "211234560018";
pub const USER: &str = "ops@example.com";
pub const PASSWORD: &str = "secret";
pub const SESSION_COOKIE: &str = "sid=abc123";

/// Gateway config pointing at `upstream`, storing files under `storage_root`.
pub fn gateway_config(upstream: &MockServer, storage_root: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.upstream.host = format!("http://{}", upstream.host());
    config.upstream.port = upstream.port();
    config.upstream.version = "v1".into();
    config.upstream.user = USER.into();
    config.upstream.password = PASSWORD.into();
    config.upstream.timeout_secs = 2;
    config.company.rut = RUT.into();
    config.storage.root = storage_root.to_path_buf();
    config
}

/// State around an in-memory settings store holding `rut`.
pub fn state_with(config: &GatewayConfig, rut: &str, ledger: Arc<dyn LedgerSource>) -> AppState {
    let settings: Arc<dyn SettingsStore> =
        Arc::new(MemorySettingsStore::with_values([(COMPANY_RUT, rut)]));
    AppState {
        upstream: Arc::new(UpstreamAccountingClient::new(&config.upstream).unwrap()),
        settings,
        ledger,
        logos: Arc::new(LogoStorage::from_config(&config.storage)),
    }
}

pub fn router_for(config: &GatewayConfig) -> (Router, AppState) {
    let state = state_with(config, &config.company.rut, Arc::new(EmptyLedger));
    (build_router(config, state.clone()), state)
}

/// Fixed receipts and entries.
pub struct FixtureLedger;

impl LedgerSource for FixtureLedger {
    fn receipts(&self) -> Vec<Value> {
        vec![json!({"id": 1, "total": 1220.0})]
    }

    fn entries(&self) -> Vec<Value> {
        vec![json!({"id": 7, "account": "1.1.01"}), json!({"id": 8, "account": "4.1.01"})]
    }

    fn entry(&self, id: &str) -> Option<Value> {
        self.entries()
            .into_iter()
            .find(|entry| entry["id"].to_string() == id)
    }
}

/// Upstream login accepting the configured credentials.
pub async fn mock_login(server: &MockServer) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/login")
                .json_body(json!({"email": USER, "password": PASSWORD}));
            then.status(200)
                .header("Set-Cookie", format!("{}; Path=/; HttpOnly", SESSION_COOKIE))
                .json_body(json!({"ok": true}));
        })
        .await
}

/// Upstream login refusing every attempt.
pub async fn mock_login_rejected(server: &MockServer) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/login");
            then.status(401).json_body(json!({"error": "bad credentials"}));
        })
        .await
}

/// Send `request` through `router` and decode the JSON body (Null when empty
/// or not JSON).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub const BOUNDARY: &str = "gateway-test-boundary";

/// Multipart body with one part per `(name, file_name, bytes)`.
pub fn post_multipart(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Run a gateway on an ephemeral port until the returned `Shutdown` fires.
pub async fn start_gateway(config: GatewayConfig, state: AppState) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_state(config, state);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}
