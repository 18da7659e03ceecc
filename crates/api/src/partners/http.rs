//! Thin reqwest wrapper shared by the partner clients.
//!
//! Every request carries `X-API-Key`. Transport and status failures are
//! mapped onto [`PartnerError`] here so the clients only deal with payloads.

use std::time::Duration;

use domain::models::partner::{PartnerError, PartnerKind};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::PartnerApiConfig;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone)]
pub struct PartnerHttp {
    kind: PartnerKind,
    client: Client,
    base_url: String,
    api_key: String,
}

impl PartnerHttp {
    pub fn new(kind: PartnerKind, config: &PartnerApiConfig) -> Result<Self, PartnerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PartnerError::Unreachable {
                partner: kind,
                message: format!("failed to build HTTP client: {}", e),
            })?;

        if config.api_key.is_empty() {
            warn!(partner = %kind, "Partner API key not configured; syncs will be skipped");
        }

        Ok(Self {
            kind,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn kind(&self) -> PartnerKind {
        self.kind
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, PartnerError> {
        if !self.is_configured() {
            return Err(PartnerError::NotConfigured(self.kind));
        }
        debug!(partner = %self.kind, method = %method, path, "Partner API request");
        Ok(self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key))
    }

    pub async fn get_json<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Value, PartnerError> {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send(path, builder).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, PartnerError> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send(path, builder).await
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> Result<Value, PartnerError> {
        let response = builder.send().await.map_err(|e| {
            warn!(partner = %self.kind, path, error = %e, "Partner API unreachable");
            PartnerError::Unreachable {
                partner: self.kind,
                message: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(path, status, response).await);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PartnerError::InvalidResponse {
                partner: self.kind,
                message: e.to_string(),
            })
    }

    async fn status_error(&self, path: &str, status: StatusCode, response: Response) -> PartnerError {
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            debug!(partner = %self.kind, path, "Partner resource not found");
        } else {
            error!(partner = %self.kind, path, status = status.as_u16(), body = %body, "Partner API error");
        }
        map_status(self.kind, status, &body)
    }
}

/// Maps a non-success status onto a partner error.
pub fn map_status(kind: PartnerKind, status: StatusCode, body: &str) -> PartnerError {
    match status {
        StatusCode::UNAUTHORIZED => PartnerError::InvalidCredentials(kind),
        StatusCode::BAD_REQUEST => PartnerError::BadRequest {
            partner: kind,
            message: error_message(body).unwrap_or_else(|| "invalid request data".to_string()),
        },
        StatusCode::NOT_FOUND => PartnerError::NotFound(kind),
        other => PartnerError::Upstream {
            partner: kind,
            status: other.as_u16(),
        },
    }
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
