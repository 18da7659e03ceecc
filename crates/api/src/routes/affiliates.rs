//! Affiliate registry routes.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use domain::models::affiliate::{
    AffiliateResponse, AffiliateStatus, CreateAffiliateRequest, UpdateAffiliateStatusRequest,
    UpdateSocialLinksRequest, UpdateSuperbetLinkRequest,
};
use domain::models::deal::{Deal, DealSummary};
use domain::models::User;
use persistence::entities::AffiliateWithEmailEntity;
use persistence::repositories::{AffiliateRepository, DealRepository, NewAccount, NewAffiliate};
use shared::password::hash_password;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, CurrentUser};
use crate::services::DealAssignment;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_affiliates).post(create_affiliate))
        .route("/:id", get(get_affiliate))
        .route("/:id/social-links", put(update_social_links))
        .route("/:id/superbet-link", put(update_superbet_link))
        .route("/:id/status", put(update_status))
}

/// The caller's affiliate id, or 403 for accounts without one.
pub(crate) fn own_affiliate_id(user: &User) -> Result<Uuid, ApiError> {
    user.affiliate_id
        .ok_or_else(|| ApiError::Forbidden("No affiliate linked to this account".to_string()))
}

fn into_response(row: AffiliateWithEmailEntity, deal: Option<&Deal>) -> AffiliateResponse {
    AffiliateResponse {
        affiliate: row.affiliate.into(),
        email: row.email,
        deal: deal.map(DealSummary::from),
    }
}

async fn load_response(state: &AppState, id: Uuid) -> Result<AffiliateResponse, ApiError> {
    let row = AffiliateRepository::new(state.pool.clone())
        .find_with_email(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?;
    let deal: Option<Deal> = match row.affiliate.deal_id {
        Some(deal_id) => DealRepository::new(state.pool.clone())
            .find_by_id(deal_id)
            .await?
            .map(Into::into),
        None => None,
    };
    Ok(into_response(row, deal.as_ref()))
}

/// GET /api/affiliates
///
/// Admins see every affiliate; an affiliate sees only itself.
pub async fn list_affiliates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AffiliateResponse>>, ApiError> {
    if !user.is_admin() {
        let Some(affiliate_id) = user.affiliate_id else {
            return Ok(Json(Vec::new()));
        };
        return match load_response(&state, affiliate_id).await {
            Ok(own) => Ok(Json(vec![own])),
            Err(ApiError::NotFound(_)) => Ok(Json(Vec::new())),
            Err(e) => Err(e),
        };
    }

    let rows = AffiliateRepository::new(state.pool.clone())
        .list_with_email()
        .await?;
    let deals: HashMap<Uuid, Deal> = DealRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(|d| (d.id, d.into()))
        .collect();

    let affiliates = rows
        .into_iter()
        .map(|row| {
            let deal = row.affiliate.deal_id.and_then(|id| deals.get(&id));
            into_response(row, deal)
        })
        .collect();
    Ok(Json(affiliates))
}

/// GET /api/affiliates/:id
pub async fn get_affiliate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AffiliateResponse>, ApiError> {
    if !user.is_admin() && user.affiliate_id != Some(id) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }
    Ok(Json(load_response(&state, id).await?))
}

/// POST /api/affiliates
///
/// Creates the login and the affiliate together. Without an explicit deal
/// the standard onboarding fallback picks one.
pub async fn create_affiliate(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateAffiliateRequest>,
) -> Result<(StatusCode, Json<AffiliateResponse>), ApiError> {
    request.validate()?;

    if let Some(deal_id) = request.deal_id {
        DealRepository::new(state.pool.clone())
            .find_by_id(deal_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Deal not found".to_string()))?;
    }

    let account = NewAccount {
        email: request.email.trim().to_lowercase(),
        password_hash: hash_password(&request.password)?,
        name: request.name.trim().to_string(),
    };
    let mut affiliate = NewAffiliate::named(account.name.clone(), AffiliateStatus::Approved);
    affiliate.external_id = request.external_id.clone();
    affiliate.superbet_affiliate_link = request.superbet_affiliate_link.clone();
    affiliate.deal_id = request.deal_id;

    let (_, created) = AffiliateRepository::new(state.pool.clone())
        .create_with_user(&account, &affiliate)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("Email or external id already registered".to_string())
            }
            other => other,
        })?;

    if request.deal_id.is_none() {
        DealAssignment::new(state.pool.clone(), state.partners.onboarding.clone())
            .ensure_deal(created.id)
            .await;
    }

    info!(admin_id = %admin.id, affiliate_id = %created.id, "Affiliate created");
    Ok((StatusCode::CREATED, Json(load_response(&state, created.id).await?)))
}

/// PUT /api/affiliates/:id/social-links
pub async fn update_social_links(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSocialLinksRequest>,
) -> Result<Json<AffiliateResponse>, ApiError> {
    request.validate()?;
    AffiliateRepository::new(state.pool.clone())
        .update_social_links(
            id,
            request.instagram_link.as_deref().map(str::trim),
            request.facebook_link.as_deref().map(str::trim),
            request.telegram_link.as_deref().map(str::trim),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?;

    info!(affiliate_id = %id, "Social links updated");
    Ok(Json(load_response(&state, id).await?))
}

/// PUT /api/affiliates/:id/superbet-link
pub async fn update_superbet_link(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSuperbetLinkRequest>,
) -> Result<Json<AffiliateResponse>, ApiError> {
    request.validate()?;
    AffiliateRepository::new(state.pool.clone())
        .update_superbet_link(
            id,
            request.superbet_affiliate_link.trim(),
            request.superbet_affiliate_id.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?;

    info!(affiliate_id = %id, "Superbet link updated");
    Ok(Json(load_response(&state, id).await?))
}

/// PUT /api/affiliates/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAffiliateStatusRequest>,
) -> Result<Json<AffiliateResponse>, ApiError> {
    AffiliateRepository::new(state.pool.clone())
        .update_status(id, request.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?;

    info!(affiliate_id = %id, status = %request.status, "Affiliate status updated");
    Ok(Json(load_response(&state, id).await?))
}
