//! `/accounting` endpoints.
//!
//! Company-scoped endpoints follow the same sequence: resolve the RUT
//! (400 when blank), log in upstream once (401 on failure), then make every
//! upstream call of the request with that one session.

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::settings::COMPANY_RUT;
use crate::upstream::{CompanyInfo, DocumentList};

const RUT_MAX_CHARS: usize = 255;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/receipts", get(get_receipts))
        .route("/entries", get(get_entries))
        .route("/entries/{id}", get(get_entry))
        .route("/sent-cfes", get(get_sent_cfes))
        .route("/settings", get(get_settings))
        .route("/save-rut", post(save_rut))
        .route("/upload-logo", post(upload_logo))
}

pub async fn get_receipts(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let receipts = state.ledger.receipts();
    if receipts.is_empty() {
        return Err(ApiError::NotFound("No receipts found"));
    }
    Ok(Json(receipts))
}

pub async fn get_entries(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let entries = state.ledger.entries();
    if entries.is_empty() {
        return Err(ApiError::NotFound("No entries found"));
    }
    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .ledger
        .entry(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("Entry not found"))
}

pub async fn get_sent_cfes(State(state): State<AppState>) -> Result<Json<DocumentList>, ApiError> {
    let company = state.company_id()?;
    let session = state.upstream.authenticate().await?;

    let documents = state
        .upstream
        .fetch_sent_documents(&company, &session)
        .await
        .map_err(|e| ApiError::not_found_as(e, "No sent CFEs found"))?;

    Ok(Json(documents))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub company_info: Option<CompanyInfo>,
    pub logo_url: Option<String>,
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsResponse>, ApiError> {
    let company = state.company_id()?;
    let session = state.upstream.authenticate().await?;

    let company_info = state.upstream.fetch_company_info(&company, &session).await.ok();
    let logo_url = match state.upstream.fetch_company_logo(&company, &session).await {
        Ok(image) => Some(state.logos.save_logo(&image).await?),
        Err(_) => None,
    };

    Ok(Json(SettingsResponse {
        company_info,
        logo_url,
    }))
}

pub async fn save_rut(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|rejection| match rejection {
        // Oversized or unreadable bodies keep their own status.
        JsonRejection::BytesRejection(ref e) => ApiError::Rejected(e.status(), e.body_text()),
        _ => {
            tracing::debug!(error = %rejection, "save-rut body rejected");
            ApiError::field("rut", "The rut field is required.")
        }
    })?;
    let rut = validate_rut(&body)?;

    // Stores may touch the filesystem.
    let settings = state.settings.clone();
    let value = rut.clone();
    tokio::task::spawn_blocking(move || settings.set(COMPANY_RUT, &value))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    tracing::info!(rut = %rut, "Company RUT updated");

    Ok(Json(json!({ "message": "RUT guardado correctamente." })))
}

fn validate_rut(body: &Value) -> Result<String, ApiError> {
    match body.get("rut") {
        Some(Value::String(rut)) => {
            let rut = rut.trim();
            if rut.is_empty() {
                Err(ApiError::field("rut", "The rut field is required."))
            } else if rut.chars().count() > RUT_MAX_CHARS {
                Err(ApiError::field(
                    "rut",
                    format!("The rut field must not be greater than {} characters.", RUT_MAX_CHARS),
                ))
            } else {
                Ok(rut.to_string())
            }
        }
        None | Some(Value::Null) => Err(ApiError::field("rut", "The rut field is required.")),
        Some(_) => Err(ApiError::field("rut", "The rut field must be a string.")),
    }
}

pub async fn upload_logo(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let file = read_logo(multipart).await?;
    let company = state.company_id()?;
    let session = state.upstream.authenticate().await?;

    state
        .upstream
        .upload_company_logo(&company, &session, file)
        .await?;

    Ok(Json(json!({ "message": "Logo actualizado correctamente." })))
}

/// Bytes of the `logo` file part.
async fn read_logo(multipart: Result<Multipart, MultipartRejection>) -> Result<Vec<u8>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "upload-logo body rejected");
        ApiError::field("logo", "The logo field is required.")
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?
    {
        if field.name() != Some("logo") {
            continue;
        }
        if field.file_name().is_none() {
            return Err(ApiError::field("logo", "The logo field must be a file."));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
        if bytes.is_empty() {
            return Err(ApiError::field("logo", "The logo field is required."));
        }
        return Ok(bytes.to_vec());
    }

    Err(ApiError::field("logo", "The logo field is required."))
}
