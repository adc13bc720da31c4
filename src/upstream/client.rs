//! HTTP client for the upstream accounting service (pymo).
//!
//! # Responsibilities
//! - Log in and capture the session cookies
//! - Fetch company-scoped resources with those cookies
//! - Upload the company logo
//! - Turn transport errors and malformed payloads into [`UpstreamError`] values
//!
//! # Design Decisions
//! - No session caching: callers authenticate once per incoming request
//! - Single attempt per call, bounded by a fixed timeout
//! - Payload fields that are missing or null count as "not found"

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upstream::session::SessionCredentials;
use crate::upstream::types::{
    CompanyId, CompanyInfo, DocumentList, UpstreamError, UpstreamResult,
};

/// File name the logo is uploaded under.
pub const LOGO_FILE_NAME: &str = "logo.jpg";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for one upstream accounting service.
#[derive(Clone)]
pub struct UpstreamAccountingClient {
    http: Client,
    base: Url,
    host: String,
    user: String,
    password: String,
}

impl UpstreamAccountingClient {
    /// Build a client from configuration. Fails if the base URL is unusable.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let raw = config.base_url();
        let base = Url::parse(&raw)
            .map_err(|e| UpstreamError::InvalidConfig(format!("'{}': {}", raw, e)))?;
        if base.cannot_be_a_base() {
            return Err(UpstreamError::InvalidConfig(format!("'{}' cannot be a base URL", raw)));
        }
        let host = base
            .host_str()
            .ok_or_else(|| UpstreamError::InvalidConfig(format!("'{}' has no host", raw)))?
            .to_string();

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::InvalidConfig(e.to_string()))?;

        tracing::debug!(base_url = %base, "Upstream client initialized");

        Ok(Self {
            http,
            base,
            host,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Log in with the configured user and collect every cookie the login
    /// response sets.
    pub async fn authenticate(&self) -> UpstreamResult<SessionCredentials> {
        let result = self.login().await;
        record("authenticate", &result);
        result
    }

    async fn login(&self) -> UpstreamResult<SessionCredentials> {
        let url = self.endpoint(&["login"]);
        let body = LoginRequest {
            email: &self.user,
            password: &self.password,
        };

        let response = self.http.post(url).json(&body).send().await.map_err(|e| {
            tracing::warn!(error = %e, "Upstream login unreachable");
            UpstreamError::Auth { reason: e.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Upstream login rejected");
            return Err(UpstreamError::Auth {
                reason: format!("status {}", status),
            });
        }

        let session = SessionCredentials::new(
            self.host.clone(),
            response
                .cookies()
                .map(|cookie| (cookie.name().to_string(), cookie.value().to_string())),
        );
        tracing::debug!(cookies = session.len(), "Upstream login succeeded");
        Ok(session)
    }

    /// `GET /companies/{rut}/sentCfes?l=1`, yielding `payload.companySentCfes`.
    pub async fn fetch_sent_documents(
        &self,
        company: &CompanyId,
        session: &SessionCredentials,
    ) -> UpstreamResult<DocumentList> {
        let url = self.endpoint(&["companies", company.as_str(), "sentCfes"]);
        let result = self
            .fetch_payload_field("fetch_sent_documents", url, &[("l", "1")], session, "companySentCfes")
            .await
            .map(DocumentList)
            .ok_or(UpstreamError::NotFound { resource: "sent CFEs" });
        record("fetch_sent_documents", &result);
        result
    }

    /// `GET /companies/{rut}`, yielding `payload.company`.
    pub async fn fetch_company_info(
        &self,
        company: &CompanyId,
        session: &SessionCredentials,
    ) -> UpstreamResult<CompanyInfo> {
        let url = self.endpoint(&["companies", company.as_str()]);
        let result = self
            .fetch_payload_field("fetch_company_info", url, &[], session, "company")
            .await
            .map(CompanyInfo)
            .ok_or(UpstreamError::NotFound { resource: "company" });
        record("fetch_company_info", &result);
        result
    }

    /// `GET /companies/{rut}/logo`, yielding the raw image bytes.
    pub async fn fetch_company_logo(
        &self,
        company: &CompanyId,
        session: &SessionCredentials,
    ) -> UpstreamResult<Vec<u8>> {
        let url = self.endpoint(&["companies", company.as_str(), "logo"]);
        let result = match self.send_get("fetch_company_logo", url, &[], session).await {
            Some(response) => match response.bytes().await {
                Ok(bytes) => Ok(bytes.to_vec()),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read upstream logo body");
                    Err(UpstreamError::NotFound { resource: "logo" })
                }
            },
            None => Err(UpstreamError::NotFound { resource: "logo" }),
        };
        record("fetch_company_logo", &result);
        result
    }

    /// `POST /companies/{rut}/logo` with `file` as the multipart part `logo`.
    pub async fn upload_company_logo(
        &self,
        company: &CompanyId,
        session: &SessionCredentials,
        file: Vec<u8>,
    ) -> UpstreamResult<()> {
        let result = self.post_logo(company, session, file).await;
        record("upload_company_logo", &result);
        result
    }

    async fn post_logo(
        &self,
        company: &CompanyId,
        session: &SessionCredentials,
        file: Vec<u8>,
    ) -> UpstreamResult<()> {
        let url = self.endpoint(&["companies", company.as_str(), "logo"]);
        let size = file.len();
        let part = Part::bytes(file)
            .file_name(LOGO_FILE_NAME)
            .mime_str("image/jpeg")
            .map_err(|e| UpstreamError::Upload { reason: e.to_string() })?;
        let form = Form::new().part("logo", part);

        let response = session
            .apply(self.http.post(url.clone()), &url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Logo upload unreachable");
                UpstreamError::Upload { reason: e.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, company = %company, "Logo upload rejected");
            return Err(UpstreamError::Upload {
                reason: format!("status {}", status),
            });
        }

        tracing::info!(company = %company, bytes = size, "Logo uploaded");
        Ok(())
    }

    /// GET with session cookies; `None` on transport error or non-2xx.
    async fn send_get(
        &self,
        operation: &'static str,
        url: Url,
        query: &[(&str, &str)],
        session: &SessionCredentials,
    ) -> Option<Response> {
        let request = session.apply(self.http.get(url.clone()), &url).query(query);
        match request.send().await {
            Ok(response) if response.status().is_success() => Some(response),
            Ok(response) => {
                tracing::warn!(operation, url = %url, status = %response.status(), "Upstream call failed");
                None
            }
            Err(e) => {
                tracing::warn!(operation, url = %url, error = %e, "Upstream call unreachable");
                None
            }
        }
    }

    async fn fetch_payload_field(
        &self,
        operation: &'static str,
        url: Url,
        query: &[(&str, &str)],
        session: &SessionCredentials,
        field: &str,
    ) -> Option<Value> {
        let response = self.send_get(operation, url, query, session).await?;
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(operation, error = %e, "Upstream body is not JSON");
                return None;
            }
        };

        let value = extract_payload_field(body, field);
        if value.is_none() {
            tracing::warn!(operation, field, "Upstream payload missing field");
        }
        value
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base can always take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// `body.payload.<field>`, treating null like absent.
fn extract_payload_field(mut body: Value, field: &str) -> Option<Value> {
    match body.get_mut("payload")?.get_mut(field)?.take() {
        Value::Null => None,
        value => Some(value),
    }
}

fn record<T>(operation: &'static str, result: &UpstreamResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_upstream_call(operation, outcome);
}
