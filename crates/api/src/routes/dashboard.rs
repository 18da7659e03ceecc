//! Reporting routes over the reconciled ledger.
//!
//! Admins see everything and may narrow to one affiliate. An affiliate sees
//! its own numbers; the per-affiliate view lists the affiliates it referred.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use domain::models::dashboard::{
    AffiliatePerformance, DashboardQuery, DateBounds, LedgerTotals, MetricsResponse,
    TransactionsPage, TransactionsQuery,
};
use domain::models::deal::Deal;
use domain::models::User;
use domain::services::resolve_terms;
use persistence::repositories::{
    AffiliateRepository, DashboardRepository, DealRepository, SystemConfigRepository,
    TransactionFilter,
};
use shared::pagination::{PageMeta, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::affiliates::own_affiliate_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/affiliates", get(affiliates))
        .route("/transactions", get(transactions))
}

fn bounds(result: Result<DateBounds, String>) -> Result<DateBounds, ApiError> {
    result.map_err(ApiError::Validation)
}

/// The single affiliate a request is about, if any. Affiliates may only
/// ask about themselves.
fn target_affiliate(user: &User, requested: Option<Uuid>) -> Result<Option<Uuid>, ApiError> {
    if user.is_admin() {
        return Ok(requested);
    }
    let own = own_affiliate_id(user)?;
    match requested {
        Some(id) if id != own => Err(ApiError::Forbidden("Access denied".to_string())),
        _ => Ok(Some(own)),
    }
}

/// GET /api/dashboard/metrics
pub async fn metrics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<MetricsResponse>, ApiError> {
    query.validate()?;
    let bounds = bounds(query.bounds())?;
    let target = target_affiliate(&user, query.affiliate_id)?;
    let scope: Option<Vec<Uuid>> = target.map(|id| vec![id]);

    let dashboard = DashboardRepository::new(state.pool.clone());
    let totals: LedgerTotals = dashboard.totals(scope.as_deref(), &bounds).await?.into();
    let total_affiliates = dashboard.count_affiliates(scope.as_deref()).await?;

    let (terms, deal_name) = match target {
        Some(affiliate_id) => {
            let deal: Option<Deal> = DealRepository::new(state.pool.clone())
                .find_for_affiliate(affiliate_id)
                .await?
                .map(Into::into);
            let defaults = SystemConfigRepository::new(state.pool.clone())
                .default_terms()
                .await?;
            (
                Some(resolve_terms(deal.as_ref(), &defaults)),
                deal.map(|d| d.name),
            )
        }
        None => (None, None),
    };

    Ok(Json(MetricsResponse {
        total_earnings: totals.total_earnings(),
        totals,
        total_affiliates,
        terms,
        deal_name,
    }))
}

/// GET /api/dashboard/affiliates
pub async fn affiliates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<AffiliatePerformance>>, ApiError> {
    query.validate()?;
    let bounds = bounds(query.bounds())?;

    let scope = if user.is_admin() {
        query.affiliate_id.map(|id| vec![id])
    } else {
        let own = own_affiliate_id(&user)?;
        Some(
            AffiliateRepository::new(state.pool.clone())
                .referral_ids(own)
                .await?,
        )
    };

    let defaults = SystemConfigRepository::new(state.pool.clone())
        .default_terms()
        .await?;
    let rows = DashboardRepository::new(state.pool.clone())
        .performance(scope.as_deref(), &bounds)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| row.into_performance(&defaults))
            .collect(),
    ))
}

/// GET /api/dashboard/transactions
pub async fn transactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsPage>, ApiError> {
    query.validate()?;
    let filter = TransactionFilter {
        scope: target_affiliate(&user, query.affiliate_id)?.map(|id| vec![id]),
        bounds: bounds(DateBounds::from_days(
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        ))?,
        status: query.status,
    };
    let page = PageRequest::new(query.page, query.limit);

    let (rows, total) = DashboardRepository::new(state.pool.clone())
        .transactions(&filter, &page)
        .await?;

    Ok(Json(TransactionsPage {
        data: rows.into_iter().map(Into::into).collect(),
        meta: PageMeta::new(page, total),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::Role;

    fn user(role: Role, affiliate_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            password_hash: String::new(),
            name: "Someone".to_string(),
            role,
            affiliate_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_targets_requested_affiliate() {
        let admin = user(Role::Admin, None);
        let id = Uuid::new_v4();
        assert_eq!(target_affiliate(&admin, Some(id)).unwrap(), Some(id));
        assert_eq!(target_affiliate(&admin, None).unwrap(), None);
    }

    #[test]
    fn test_affiliate_is_pinned_to_itself() {
        let own = Uuid::new_v4();
        let affiliate = user(Role::Affiliate, Some(own));
        assert_eq!(target_affiliate(&affiliate, None).unwrap(), Some(own));
        assert_eq!(target_affiliate(&affiliate, Some(own)).unwrap(), Some(own));
        assert!(matches!(
            target_affiliate(&affiliate, Some(Uuid::new_v4())),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_invalid_dates_are_validation_errors() {
        let query = DashboardQuery {
            start_date: Some("2024-05-10".to_string()),
            end_date: Some("2024-05-01".to_string()),
            affiliate_id: None,
        };
        assert!(matches!(bounds(query.bounds()), Err(ApiError::Validation(_))));
    }
}
