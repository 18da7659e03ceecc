//! Deal repository.

use domain::models::deal::{NewDeal, UpdateDealRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{DealAffiliateEntity, DealEntity};
use crate::metrics::QueryTimer;

/// Repository for deal database operations.
#[derive(Clone)]
pub struct DealRepository {
    pool: PgPool,
}

impl DealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<DealEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_deals");
        let result = sqlx::query_as::<_, DealEntity>(
            r#"
            SELECT id, name, cpa_value, rev_share_percentage, active, description, created_at, updated_at
            FROM deals
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Affiliates attached to any of `deal_ids`.
    pub async fn list_affiliates(
        &self,
        deal_ids: &[Uuid],
    ) -> Result<Vec<DealAffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_deal_affiliates");
        let result = sqlx::query_as::<_, DealAffiliateEntity>(
            r#"
            SELECT a.deal_id AS deal_id, a.id, a.name, u.email
            FROM affiliates a
            JOIN users u ON u.id = a.user_id
            WHERE a.deal_id = ANY($1)
            ORDER BY a.name
            "#,
        )
        .bind(deal_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DealEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_deal_by_id");
        let result = sqlx::query_as::<_, DealEntity>(
            r#"
            SELECT id, name, cpa_value, rev_share_percentage, active, description, created_at, updated_at
            FROM deals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Oldest active deal with exactly this name.
    pub async fn find_active_by_name(&self, name: &str) -> Result<Option<DealEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_deal_by_name");
        let result = sqlx::query_as::<_, DealEntity>(
            r#"
            SELECT id, name, cpa_value, rev_share_percentage, active, description, created_at, updated_at
            FROM deals
            WHERE name = $1 AND active
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The deal associated with an affiliate, active or not.
    pub async fn find_for_affiliate(
        &self,
        affiliate_id: Uuid,
    ) -> Result<Option<DealEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_deal_for_affiliate");
        let result = sqlx::query_as::<_, DealEntity>(
            r#"
            SELECT d.id, d.name, d.cpa_value, d.rev_share_percentage, d.active, d.description,
                   d.created_at, d.updated_at
            FROM deals d
            JOIN affiliates a ON a.deal_id = d.id
            WHERE a.id = $1
            "#,
        )
        .bind(affiliate_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, deal: &NewDeal) -> Result<DealEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_deal");
        let result = sqlx::query_as::<_, DealEntity>(
            r#"
            INSERT INTO deals (name, cpa_value, rev_share_percentage, active, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, cpa_value, rev_share_percentage, active, description, created_at, updated_at
            "#,
        )
        .bind(&deal.name)
        .bind(deal.cpa_value)
        .bind(deal.rev_share_percentage)
        .bind(deal.active)
        .bind(&deal.description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update; absent fields keep their stored value.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UpdateDealRequest,
    ) -> Result<Option<DealEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_deal");
        let result = sqlx::query_as::<_, DealEntity>(
            r#"
            UPDATE deals
            SET name = COALESCE($2, name),
                cpa_value = COALESCE($3, cpa_value),
                rev_share_percentage = COALESCE($4, rev_share_percentage),
                active = COALESCE($5, active),
                description = COALESCE($6, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, cpa_value, rev_share_percentage, active, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.cpa_value)
        .bind(changes.rev_share_percentage)
        .bind(changes.active)
        .bind(&changes.description)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Number of affiliates still pointing at the deal.
    pub async fn count_affiliates(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_deal_affiliates");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM affiliates WHERE deal_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns false when no deal had this id.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_deal");
        let result = sqlx::query("DELETE FROM deals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
