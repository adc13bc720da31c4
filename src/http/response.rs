//! Error-to-JSON mapping for the accounting API.
//!
//! Every handler returns `Result<_, ApiError>`; known conditions map to a
//! specific status here, anything else becomes a logged 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;

use crate::settings::SettingsError;
use crate::storage::StorageError;
use crate::upstream::UpstreamError;

/// Field name → messages, rendered as `{"errors": {...}}`.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    /// The company RUT has not been configured.
    CompanyNotSet,
    /// Upstream login failed.
    LoginFailed,
    /// Nothing to return; the message is shown to the client.
    NotFound(&'static str),
    /// Caller input failed validation.
    Validation(FieldErrors),
    /// Upstream refused the logo.
    UploadFailed,
    /// Request rejected before validation (e.g. body too large).
    Rejected(StatusCode, String),
    /// Anything unexpected.
    Internal(String),
}

impl ApiError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field, vec![message.into()]);
        ApiError::Validation(errors)
    }

    /// Replace a generic not-found with an endpoint-specific message.
    pub fn not_found_as(err: UpstreamError, message: &'static str) -> Self {
        match err {
            UpstreamError::NotFound { .. } => ApiError::NotFound(message),
            other => other.into(),
        }
    }
}

/// `{"message": ...}` with the given status.
pub fn message(status: StatusCode, text: impl Into<String>) -> Response {
    (status, Json(json!({ "message": text.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::CompanyNotSet => message(StatusCode::BAD_REQUEST, "Company RUT is not set"),
            ApiError::LoginFailed => message(StatusCode::UNAUTHORIZED, "Login failed"),
            ApiError::NotFound(text) => message(StatusCode::NOT_FOUND, text),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::UploadFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error al actualizar el logo." })),
            )
                .into_response(),
            ApiError::Rejected(status, text) => message(status, text),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An unexpected error occurred",
                        "message": detail,
                    })),
                )
                    .into_response()
            }
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::ConfigMissing { .. } => ApiError::CompanyNotSet,
            UpstreamError::Auth { .. } => ApiError::LoginFailed,
            UpstreamError::NotFound { .. } => ApiError::NotFound("Resource not found"),
            UpstreamError::Upload { .. } => ApiError::UploadFailed,
            UpstreamError::InvalidConfig(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
