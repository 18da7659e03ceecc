//! On-demand partner syncs for admins.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use domain::models::partner::PartnerKind;
use domain::services::{AffiliateSyncSummary, SyncSummary};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::services::sync::{ConnectionReport, SyncRangeQuery};
use crate::services::SyncService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:partner/affiliates", post(sync_affiliates))
        .route("/:partner/results", post(sync_results))
        .route("/:partner/test", get(test_connection))
}

fn service(state: &AppState) -> SyncService {
    SyncService::new(
        state.pool.clone(),
        state.partners.clone(),
        state.sync_locks.clone(),
        &state.config,
    )
}

/// POST /api/sync/:partner/affiliates
pub async fn sync_affiliates(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(partner): Path<PartnerKind>,
) -> Result<Json<AffiliateSyncSummary>, ApiError> {
    info!(admin_id = %admin.id, partner = %partner, "Manual affiliate sync requested");
    Ok(Json(service(&state).run_affiliate_sync(partner).await?))
}

/// POST /api/sync/:partner/results
///
/// Reconciles `startDate..=endDate` when both are given, else the rolling window.
pub async fn sync_results(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(partner): Path<PartnerKind>,
    Query(query): Query<SyncRangeQuery>,
) -> Result<Json<SyncSummary>, ApiError> {
    let range = query.range()?;
    info!(admin_id = %admin.id, partner = %partner, range = ?range, "Manual results sync requested");
    Ok(Json(service(&state).run_results_sync(partner, range).await?))
}

/// GET /api/sync/:partner/test
pub async fn test_connection(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(partner): Path<PartnerKind>,
) -> Json<ConnectionReport> {
    Json(service(&state).test_connection(partner).await)
}
