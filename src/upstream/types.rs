//! Upstream data types and error definitions.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Company identifier (RUT) for company-scoped calls.
///
/// Never blank: construction fails with [`UpstreamError::ConfigMissing`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanyId(String);

impl CompanyId {
    pub fn new(rut: impl Into<String>) -> UpstreamResult<Self> {
        let rut = rut.into();
        let trimmed = rut.trim();
        if trimmed.is_empty() {
            return Err(UpstreamError::ConfigMissing { setting: "COMPANY_RUT" });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `payload.companySentCfes` as returned upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DocumentList(pub Value);

/// `payload.company` as returned upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompanyInfo(pub Value);

/// Errors produced by upstream operations. Every failure is a value; the
/// client never panics on bad upstream input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// A required setting is blank.
    #[error("{setting} is not set")]
    ConfigMissing { setting: &'static str },

    /// Login was rejected or the service was unreachable.
    #[error("Login failed: {reason}")]
    Auth { reason: String },

    /// The resource is missing, the call failed, or the payload lacked the
    /// expected field.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Upstream did not accept an upload.
    #[error("Upload rejected: {reason}")]
    Upload { reason: String },

    /// The client could not be built from its configuration.
    #[error("Invalid upstream configuration: {0}")]
    InvalidConfig(String),
}

impl UpstreamError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::ConfigMissing { .. } => "config_missing",
            UpstreamError::Auth { .. } => "auth_failed",
            UpstreamError::NotFound { .. } => "not_found",
            UpstreamError::Upload { .. } => "upload_failed",
            UpstreamError::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;
