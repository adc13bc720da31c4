//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the accounting handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve the storage directory so stored logos resolve
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::get,
    BoxError, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::{request_id, track_metrics, UuidRequestId};
use crate::http::response::ApiError;
use crate::http::{accounting, health};
use crate::ledger::{EmptyLedger, LedgerSource};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::settings::{
    EnvFileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore, COMPANY_RUT,
};
use crate::storage::LogoStorage;
use crate::upstream::{CompanyId, UpstreamAccountingClient, UpstreamError};

/// Mount point of the storage directory.
pub const STORAGE_ROUTE: &str = "/storage";

/// Errors while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamAccountingClient>,
    pub settings: Arc<dyn SettingsStore>,
    pub ledger: Arc<dyn LedgerSource>,
    pub logos: Arc<LogoStorage>,
}

impl AppState {
    /// Build the default collaborators described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        let upstream = UpstreamAccountingClient::new(&config.upstream)?;

        let settings: Arc<dyn SettingsStore> = match &config.storage.settings_file {
            Some(path) => {
                let store = EnvFileSettingsStore::open(path)?
                    .with_default(COMPANY_RUT, &config.company.rut);
                tracing::info!(path = %store.path().display(), "Settings backed by env file");
                Arc::new(store)
            }
            None => Arc::new(MemorySettingsStore::with_values([(
                COMPANY_RUT,
                config.company.rut.clone(),
            )])),
        };

        let state = Self {
            upstream: Arc::new(upstream),
            settings,
            ledger: Arc::new(EmptyLedger),
            logos: Arc::new(LogoStorage::from_config(&config.storage)),
        };
        if state.company_id().is_err() {
            tracing::warn!("COMPANY_RUT is not set; company endpoints answer 400 until it is saved");
        }
        Ok(state)
    }

    /// The configured company, or 400 when the RUT is blank.
    pub fn company_id(&self) -> Result<CompanyId, ApiError> {
        let rut = self.settings.get(COMPANY_RUT).unwrap_or_default();
        Ok(CompanyId::new(rut)?)
    }
}

/// HTTP server for the accounting gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server around explicitly supplied collaborators.
    pub fn with_state(config: GatewayConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    let storage = ServeDir::new(state.logos.root());

    Router::new()
        .route("/health", get(health::get_status))
        .nest("/accounting", accounting::router())
        .route_layer(middleware::from_fn(track_metrics))
        .nest_service(STORAGE_ROUTE, storage)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
}

/// Errors raised by the middleware stack itself, rendered as the JSON 500.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Internal("Request timed out".to_string())
    } else {
        ApiError::Internal(err.to_string())
    }
}
