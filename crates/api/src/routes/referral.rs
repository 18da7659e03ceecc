//! Referral self-registration and stats.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use domain::models::affiliate::{
    AffiliateStatus, ReferralRegisterRequest, ReferralStats, ReferralSummary,
};
use persistence::repositories::{AffiliateRepository, NewAccount, NewAffiliate, UserRepository};
use serde::Serialize;
use shared::password::hash_password;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::affiliates::own_affiliate_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/stats", get(stats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub referred_by: String,
    pub message: String,
}

/// POST /api/referral/register
///
/// The referral code is the referrer's affiliate id or its OTG external id.
/// The new affiliate starts PENDING.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<ReferralRegisterRequest>,
) -> Result<(StatusCode, Json<ReferralRegisterResponse>), ApiError> {
    request.validate()?;
    let affiliates = AffiliateRepository::new(state.pool.clone());

    let referrer = affiliates
        .find_by_referral_code(request.referral_code.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid referral code".to_string()))?;

    let email = request.email.trim().to_lowercase();
    if UserRepository::new(state.pool.clone())
        .find_by_email(&email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let account = NewAccount {
        email,
        password_hash: hash_password(&request.password)?,
        name: request.name.trim().to_string(),
    };
    let mut affiliate = NewAffiliate::named(account.name.clone(), AffiliateStatus::Pending);
    affiliate.referred_by_id = Some(referrer.id);

    let (user, created) = affiliates
        .create_with_user(&account, &affiliate)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already registered".to_string()),
            other => other,
        })?;

    info!(affiliate_id = %created.id, referrer_id = %referrer.id, "Affiliate registered via referral");
    Ok((
        StatusCode::CREATED,
        Json(ReferralRegisterResponse {
            id: created.id,
            email: user.email,
            name: user.name,
            referred_by: referrer.name,
            message: "Registration completed via referral link".to_string(),
        }),
    ))
}

/// GET /api/referral/stats
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ReferralStats>, ApiError> {
    let affiliate_id = own_affiliate_id(&user)?;
    let referrals: Vec<ReferralSummary> = AffiliateRepository::new(state.pool.clone())
        .list_referrals(affiliate_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let approved = referrals
        .iter()
        .filter(|r| r.status == AffiliateStatus::Approved)
        .count();
    Ok(Json(ReferralStats {
        affiliate_id,
        total_referrals: referrals.len() as i64,
        approved_referrals: approved as i64,
        referrals,
    }))
}
