//! Invite routes: admin management plus the public registration flow.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use domain::models::invite::{
    CreateInviteRequest, CreateInviteResponse, InviteListItem, InviteRegisterRequest,
    InviteRegistrationResponse, InviteStatus, ListInvitesQuery, PendingInvitesSummary,
    PublicInvite,
};
use domain::models::partner::RegistrationStatus;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::services::OnboardingService;

pub fn router() -> Router<AppState> {
    // One parameter name per segment: `:code` is the invite id for check-status.
    Router::new()
        .route("/", get(list_invites).post(create_invite))
        .route("/sync-pending", post(sync_pending))
        .route("/:code", get(get_invite))
        .route("/:code/register", post(register))
        .route("/:code/check-status", post(check_status))
}

fn service(state: &AppState) -> OnboardingService {
    OnboardingService::new(state.pool.clone(), state.partners.onboarding.clone())
}

/// POST /api/invites
pub async fn create_invite(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), ApiError> {
    request.validate()?;
    let response = service(&state).create_invite(&request).await?;
    info!(admin_id = %admin.id, invite_id = %response.invite.id, "Invite issued");
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/invites
pub async fn list_invites(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListInvitesQuery>,
) -> Result<Json<Vec<InviteListItem>>, ApiError> {
    Ok(Json(service(&state).list_invites(query.status).await?))
}

/// GET /api/invites/:code
pub async fn get_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PublicInvite>, ApiError> {
    Ok(Json(service(&state).public_invite(&code).await?))
}

/// POST /api/invites/:code/register
///
/// 201 when Superbet approves on the spot, 202 otherwise.
pub async fn register(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<InviteRegisterRequest>,
) -> Result<(StatusCode, Json<InviteRegistrationResponse>), ApiError> {
    request.validate()?;
    let response = service(&state).register_with_invite(&code, &request).await?;
    let status = if response.status == InviteStatus::Approved {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(response)))
}

/// POST /api/invites/:id/check-status
pub async fn check_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationStatus>, ApiError> {
    Ok(Json(service(&state).check_status(id).await?))
}

/// POST /api/invites/sync-pending
pub async fn sync_pending(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<PendingInvitesSummary>, ApiError> {
    Ok(Json(service(&state).check_pending_invites().await?))
}
