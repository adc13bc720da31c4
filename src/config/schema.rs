//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the accounting gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound HTTP server settings.
    pub server: ServerConfig,

    /// Upstream accounting service (pymo) connection settings.
    pub upstream: UpstreamConfig,

    /// Company the gateway acts for.
    pub company: CompanyConfig,

    /// Local file storage (logo, settings file).
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Inbound server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed to handle one incoming request, in seconds. Must
    /// exceed the longest chain of upstream calls a request can make.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes (covers logo uploads).
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 100,
            max_body_size: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// Most upstream calls any single incoming request makes.
pub const MAX_UPSTREAM_CALLS_PER_REQUEST: u64 = 3;

/// Upstream accounting service configuration.
///
/// The base URL is composed as `{host}:{port}/{version}`, so `host` carries
/// the scheme (e.g. "https://pymo.example.com").
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and host name of the service.
    pub host: String,

    /// TCP port of the service.
    pub port: u16,

    /// API version path segment (e.g. "v1").
    pub version: String,

    /// Login user (sent as `email`).
    pub user: String,

    /// Login password.
    pub password: String,

    /// Timeout for a single upstream round trip, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    /// Base URL string as the upstream service expects it.
    pub fn base_url(&self) -> String {
        format!(
            "{}:{}/{}",
            self.host.trim_end_matches('/'),
            self.port,
            self.version.trim_matches('/')
        )
    }

    /// Worst-case time spent upstream by one incoming request: login plus
    /// the two fetches of `GET /settings`, each at its full timeout.
    pub fn request_budget_secs(&self) -> u64 {
        self.timeout_secs.saturating_mul(MAX_UPSTREAM_CALLS_PER_REQUEST)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            port: 80,
            version: "v1".to_string(),
            user: String::new(),
            password: String::new(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("version", &self.version)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Company settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CompanyConfig {
    /// Company RUT. Blank means "not configured yet".
    pub rut: String,
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory served under `public_url`; the company logo lands here.
    pub root: PathBuf,

    /// URL prefix the storage root is served at.
    pub public_url: String,

    /// Optional `KEY=VALUE` file persisting runtime settings (the RUT).
    pub settings_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
            public_url: "/storage".to_string(),
            settings_file: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
