//! Superbet webhook receiver.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use domain::models::partner::SuperbetWebhookPayload;
use shared::crypto::secrets_match;
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::onboarding::WebhookOutcome;
use crate::services::OnboardingService;

pub const WEBHOOK_TOKEN_HEADER: &str = "X-Webhook-Token";

pub fn router() -> Router<AppState> {
    Router::new().route("/superbet", post(superbet_webhook))
}

/// Checks the shared secret. An unset secret rejects every call.
fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let presented = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if expected.is_empty() || presented.is_empty() || !secrets_match(presented, expected) {
        return Err(ApiError::Unauthorized("Invalid webhook token".to_string()));
    }
    Ok(())
}

/// POST /api/webhooks/superbet
///
/// The token is checked before the body is parsed.
pub async fn superbet_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookOutcome>, ApiError> {
    if let Err(e) = authorize(&headers, &state.config.partners.superbet.webhook_token) {
        warn!("Rejected Superbet webhook with a bad token");
        return Err(e);
    }

    let payload: SuperbetWebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid webhook payload: {}", e)))?;

    let outcome = OnboardingService::new(state.pool.clone(), state.partners.onboarding.clone())
        .handle_webhook(&payload)
        .await?;
    Ok(Json(outcome))
}
