//! Commission configuration routes.

use axum::{extract::State, routing::get, Json, Router};
use domain::models::system_config::{CommissionConfigResponse, UpdateCommissionConfigRequest};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, CurrentUser};
use crate::services::SystemConfigService;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_config).put(update_config))
}

/// GET /api/config
pub async fn get_config(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<CommissionConfigResponse>, ApiError> {
    let config = SystemConfigService::new(state.pool.clone())
        .commission_config()
        .await?;
    Ok(Json(config))
}

/// PUT /api/config
pub async fn update_config(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<UpdateCommissionConfigRequest>,
) -> Result<Json<CommissionConfigResponse>, ApiError> {
    request.validate()?;
    let config = SystemConfigService::new(state.pool.clone())
        .update(&request)
        .await?;
    Ok(Json(config))
}
