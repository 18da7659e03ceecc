//! Login and account maintenance routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use domain::models::user::{
    ChangeCredentialsRequest, LoginRequest, LoginResponse, RegisterUserRequest,
    ResetPasswordRequest, UserResponse,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, CurrentUser};
use crate::services::AuthService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/register", post(register))
        .route("/reset-password/:user_id", put(reset_password))
        .route("/change-credentials", put(change_credentials))
}

fn service(state: &AppState) -> AuthService {
    AuthService::new(state.pool.clone(), state.jwt.clone())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let response = service(&state).login(&request).await?;
    Ok(Json(response))
}

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

/// POST /api/auth/register
///
/// Admin-only account creation. Role defaults to AFFILIATE.
pub async fn register(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;
    let user = service(&state).register(&request).await?;
    info!(admin_id = %admin.id, user_id = %user.id, "Account created by admin");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/auth/reset-password/:user_id
pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;
    service(&state)
        .reset_password(user_id, &request.new_password)
        .await?;
    info!(admin_id = %admin.id, user_id = %user_id, "Password reset");
    Ok(Json(json!({ "message": "Password updated" })))
}

/// PUT /api/auth/change-credentials
pub async fn change_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangeCredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;
    let updated = service(&state).change_credentials(&user, &request).await?;
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let request: LoginRequest = serde_json::from_value(json!({
            "email": "not-an-email",
            "password": "secret"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_change_credentials_short_password() {
        let request: ChangeCredentialsRequest = serde_json::from_value(json!({
            "currentPassword": "old-secret",
            "newPassword": "123"
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("new_password"));
    }
}
