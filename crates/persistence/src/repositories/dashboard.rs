//! Read-only aggregation queries behind the dashboard endpoints.
//!
//! Every query takes an optional affiliate scope (`None` means all
//! affiliates) and half-open date bounds `[from, until)`.

use domain::models::dashboard::DateBounds;
use domain::models::ledger::TransactionStatus;
use shared::pagination::PageRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    AffiliatePerformanceEntity, LedgerTotalsEntity, TransactionStatusDb, TransactionViewEntity,
};
use crate::metrics::QueryTimer;

/// Filters for the transactions listing.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub scope: Option<Vec<Uuid>>,
    pub bounds: DateBounds,
    pub status: Option<TransactionStatus>,
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// FTD count, CPA count and value, revenue-share total.
    pub async fn totals(
        &self,
        scope: Option<&[Uuid]>,
        bounds: &DateBounds,
    ) -> Result<LedgerTotalsEntity, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_totals");
        let result = sqlx::query_as::<_, LedgerTotalsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ftds f
                  WHERE ($1::uuid[] IS NULL OR f.affiliate_id = ANY($1))
                    AND ($2::timestamptz IS NULL OR f.date >= $2)
                    AND ($3::timestamptz IS NULL OR f.date < $3)) AS total_ftds,
                (SELECT COUNT(*) FROM commissions c
                  WHERE c.type = 'CPA'
                    AND ($1::uuid[] IS NULL OR c.affiliate_id = ANY($1))
                    AND ($2::timestamptz IS NULL OR c.date >= $2)
                    AND ($3::timestamptz IS NULL OR c.date < $3)) AS cpa_count,
                (SELECT COALESCE(SUM(c.amount), 0) FROM commissions c
                  WHERE c.type = 'CPA'
                    AND ($1::uuid[] IS NULL OR c.affiliate_id = ANY($1))
                    AND ($2::timestamptz IS NULL OR c.date >= $2)
                    AND ($3::timestamptz IS NULL OR c.date < $3)) AS cpa_total,
                (SELECT COALESCE(SUM(r.commission), 0) FROM rev_share_reports r
                  WHERE ($1::uuid[] IS NULL OR r.affiliate_id = ANY($1))
                    AND ($2::timestamptz IS NULL OR r.date >= $2)
                    AND ($3::timestamptz IS NULL OR r.date < $3)) AS rev_share_total
            "#,
        )
        .bind(scope)
        .bind(bounds.from)
        .bind(bounds.until)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_affiliates(&self, scope: Option<&[Uuid]>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_count_affiliates");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM affiliates
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
            "#,
        )
        .bind(scope)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Per-affiliate totals with deal columns, ordered by name.
    pub async fn performance(
        &self,
        scope: Option<&[Uuid]>,
        bounds: &DateBounds,
    ) -> Result<Vec<AffiliatePerformanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_affiliate_performance");
        let result = sqlx::query_as::<_, AffiliatePerformanceEntity>(
            r#"
            SELECT
                a.id AS affiliate_id,
                a.name,
                a.status,
                a.referred_by_id,
                d.name AS deal_name,
                d.cpa_value AS deal_cpa_value,
                d.rev_share_percentage AS deal_rev_share_percentage,
                d.active AS deal_active,
                (SELECT COUNT(*) FROM ftds f
                  WHERE f.affiliate_id = a.id
                    AND ($2::timestamptz IS NULL OR f.date >= $2)
                    AND ($3::timestamptz IS NULL OR f.date < $3)) AS total_ftds,
                (SELECT COUNT(*) FROM commissions c
                  WHERE c.affiliate_id = a.id AND c.type = 'CPA'
                    AND ($2::timestamptz IS NULL OR c.date >= $2)
                    AND ($3::timestamptz IS NULL OR c.date < $3)) AS cpa_count,
                (SELECT COALESCE(SUM(c.amount), 0) FROM commissions c
                  WHERE c.affiliate_id = a.id AND c.type = 'CPA'
                    AND ($2::timestamptz IS NULL OR c.date >= $2)
                    AND ($3::timestamptz IS NULL OR c.date < $3)) AS cpa_total,
                (SELECT COALESCE(SUM(r.commission), 0) FROM rev_share_reports r
                  WHERE r.affiliate_id = a.id
                    AND ($2::timestamptz IS NULL OR r.date >= $2)
                    AND ($3::timestamptz IS NULL OR r.date < $3)) AS rev_share_total
            FROM affiliates a
            LEFT JOIN deals d ON d.id = a.deal_id
            WHERE ($1::uuid[] IS NULL OR a.id = ANY($1))
            ORDER BY a.name
            "#,
        )
        .bind(scope)
        .bind(bounds.from)
        .bind(bounds.until)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One page of the ledger, newest first, plus the total row count.
    pub async fn transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<TransactionViewEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("dashboard_transactions");
        let status = filter.status.map(TransactionStatusDb::from);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM transactions t
            WHERE ($1::uuid[] IS NULL OR t.affiliate_id = ANY($1))
              AND ($2::timestamptz IS NULL OR t.date >= $2)
              AND ($3::timestamptz IS NULL OR t.date < $3)
              AND ($4::transaction_status IS NULL OR t.status = $4)
            "#,
        )
        .bind(filter.scope.as_deref())
        .bind(filter.bounds.from)
        .bind(filter.bounds.until)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, TransactionViewEntity>(
            r#"
            SELECT t.id, t.affiliate_id, t.player_id, t.amount, t.type, t.status, t.date,
                   t.description, a.name AS affiliate_name
            FROM transactions t
            JOIN affiliates a ON a.id = t.affiliate_id
            WHERE ($1::uuid[] IS NULL OR t.affiliate_id = ANY($1))
              AND ($2::timestamptz IS NULL OR t.date >= $2)
              AND ($3::timestamptz IS NULL OR t.date < $3)
              AND ($4::transaction_status IS NULL OR t.status = $4)
            ORDER BY t.date DESC, t.id
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.scope.as_deref())
        .bind(filter.bounds.from)
        .bind(filter.bounds.until)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        timer.record();
        Ok((rows, total))
    }
}
