//! Deal management routes.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use domain::models::affiliate::AffiliateResponse;
use domain::models::deal::{
    CreateDealRequest, Deal, DealAffiliate, DealAssociationResponse, DealWithAffiliates, NewDeal,
    UpdateDealRequest,
};
use persistence::repositories::{AffiliateRepository, DealRepository};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, CurrentUser};
use crate::services::DealAssignment;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deals).post(create_deal))
        .route("/:id", get(get_deal).put(update_deal).delete(delete_deal))
        .route(
            "/:deal_id/affiliates/:affiliate_id",
            post(associate_deal).delete(dissociate_deal),
        )
}

fn not_found() -> ApiError {
    ApiError::NotFound("Deal not found".to_string())
}

/// GET /api/deals
///
/// Admins get every deal with its affiliates; an affiliate gets its own deal.
pub async fn list_deals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DealWithAffiliates>>, ApiError> {
    let repo = DealRepository::new(state.pool.clone());

    if !user.is_admin() {
        let Some(affiliate_id) = user.affiliate_id else {
            return Ok(Json(Vec::new()));
        };
        let own = repo.find_for_affiliate(affiliate_id).await?;
        return Ok(Json(
            own.map(|deal| DealWithAffiliates {
                deal: deal.into(),
                affiliates: Vec::new(),
            })
            .into_iter()
            .collect(),
        ));
    }

    let deals: Vec<Deal> = repo.list().await?.into_iter().map(Into::into).collect();
    let ids: Vec<Uuid> = deals.iter().map(|d| d.id).collect();

    let mut by_deal: HashMap<Uuid, Vec<DealAffiliate>> = HashMap::new();
    for row in repo.list_affiliates(&ids).await? {
        by_deal.entry(row.deal_id).or_default().push(row.into());
    }

    let deals = deals
        .into_iter()
        .map(|deal| {
            let affiliates = by_deal.remove(&deal.id).unwrap_or_default();
            DealWithAffiliates { deal, affiliates }
        })
        .collect();
    Ok(Json(deals))
}

/// GET /api/deals/:id
pub async fn get_deal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DealWithAffiliates>, ApiError> {
    let repo = DealRepository::new(state.pool.clone());
    let deal: Deal = repo.find_by_id(id).await?.ok_or_else(not_found)?.into();

    if !user.is_admin() {
        let own = match user.affiliate_id {
            Some(affiliate_id) => repo.find_for_affiliate(affiliate_id).await?,
            None => None,
        };
        if own.map(|d| d.id) != Some(id) {
            return Err(ApiError::Forbidden("Access denied".to_string()));
        }
        return Ok(Json(DealWithAffiliates {
            deal,
            affiliates: Vec::new(),
        }));
    }

    let affiliates = repo
        .list_affiliates(&[id])
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(DealWithAffiliates { deal, affiliates }))
}

/// POST /api/deals
pub async fn create_deal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<Deal>), ApiError> {
    request.validate()?;
    let new_deal: NewDeal = request.into();
    let deal: Deal = DealRepository::new(state.pool.clone())
        .create(&new_deal)
        .await?
        .into();

    info!(admin_id = %admin.id, deal_id = %deal.id, name = %deal.name, "Deal created");
    Ok((StatusCode::CREATED, Json(deal)))
}

/// PUT /api/deals/:id
pub async fn update_deal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDealRequest>,
) -> Result<Json<Deal>, ApiError> {
    request.validate()?;
    let deal: Deal = DealRepository::new(state.pool.clone())
        .update(id, &request)
        .await?
        .ok_or_else(not_found)?
        .into();

    info!(deal_id = %deal.id, "Deal updated");
    Ok(Json(deal))
}

/// DELETE /api/deals/:id
///
/// Refused while any affiliate still references the deal.
pub async fn delete_deal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let repo = DealRepository::new(state.pool.clone());
    repo.find_by_id(id).await?.ok_or_else(not_found)?;

    let referenced = repo.count_affiliates(id).await?;
    if referenced > 0 {
        return Err(ApiError::Conflict(format!(
            "Cannot delete deal: {} affiliate(s) are associated with it",
            referenced
        )));
    }

    if !repo.delete(id).await? {
        return Err(not_found());
    }
    info!(deal_id = %id, "Deal deleted");
    Ok(Json(json!({ "message": "Deal deleted" })))
}

/// POST /api/deals/:deal_id/affiliates/:affiliate_id
///
/// Associates the deal and issues the affiliate a fresh password.
pub async fn associate_deal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((deal_id, affiliate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DealAssociationResponse>, ApiError> {
    let response = DealAssignment::new(state.pool.clone(), state.partners.onboarding.clone())
        .associate(deal_id, affiliate_id)
        .await?;
    info!(admin_id = %admin.id, deal_id = %deal_id, affiliate_id = %affiliate_id, "Deal associated");
    Ok(Json(response))
}

/// DELETE /api/deals/:deal_id/affiliates/:affiliate_id
pub async fn dissociate_deal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path((deal_id, affiliate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AffiliateResponse>, ApiError> {
    let row = AffiliateRepository::new(state.pool.clone())
        .find_with_email(affiliate_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?;
    if row.affiliate.deal_id != Some(deal_id) {
        return Err(ApiError::Validation(
            "Affiliate is not associated with this deal".to_string(),
        ));
    }

    let affiliate = DealAssignment::new(state.pool.clone(), state.partners.onboarding.clone())
        .dissociate(affiliate_id)
        .await?;
    info!(deal_id = %deal_id, affiliate_id = %affiliate_id, "Deal dissociated");
    Ok(Json(AffiliateResponse {
        affiliate,
        email: row.email,
        deal: None,
    }))
}
