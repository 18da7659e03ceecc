//! PostgreSQL implementation of the reconciliation `LedgerStore`.

use async_trait::async_trait;
use domain::models::affiliate::AffiliateStatus;
use domain::models::deal::Deal;
use domain::models::ledger::{TransactionStatus, TransactionType};
use domain::models::partner::PartnerKind;
use domain::services::commission::DayWindow;
use domain::services::ledger::{
    FtdEntry, LedgerError, LedgerStore, LinkedAffiliate, NewPartnerAffiliate, RevShareEntry,
};
use domain::services::DefaultTerms;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{LinkedAffiliateEntity, TransactionStatusDb, TransactionTypeDb};
use crate::metrics::QueryTimer;
use crate::repositories::{
    AffiliateRepository, DealRepository, NewAccount, NewAffiliate, SystemConfigRepository,
};

/// Maps a sqlx error onto the ledger error kinds.
pub fn ledger_error(err: sqlx::Error) -> LedgerError {
    match &err {
        sqlx::Error::RowNotFound => LedgerError::NotFound(err.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            LedgerError::Conflict(db.message().to_string())
        }
        _ => LedgerError::Storage(err.to_string()),
    }
}

fn partner_column(partner: PartnerKind) -> &'static str {
    match partner {
        PartnerKind::Otg => "external_id",
        PartnerKind::Superbet => "superbet_affiliate_id",
    }
}

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    affiliates: AffiliateRepository,
    deals: DealRepository,
    config: SystemConfigRepository,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            affiliates: AffiliateRepository::new(pool.clone()),
            deals: DealRepository::new(pool.clone()),
            config: SystemConfigRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn find_partner_affiliate(
        &self,
        partner: PartnerKind,
        external_id: &str,
    ) -> Result<Option<LinkedAffiliate>, LedgerError> {
        let column = partner_column(partner);
        let timer = QueryTimer::new("find_partner_affiliate");
        let result = sqlx::query_as::<_, LinkedAffiliateEntity>(&format!(
            "SELECT id, name, {column} AS external_id FROM affiliates WHERE {column} = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(ledger_error)?.map(Into::into))
    }

    async fn create_partner_affiliate(
        &self,
        partner: PartnerKind,
        new: &NewPartnerAffiliate,
    ) -> Result<Uuid, LedgerError> {
        let account = NewAccount {
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            name: new.name.clone(),
        };
        let mut affiliate = NewAffiliate::named(new.name.clone(), AffiliateStatus::Approved);
        affiliate.site_ids = new.site_ids.clone();
        match partner {
            PartnerKind::Otg => affiliate.external_id = Some(new.external_id.clone()),
            PartnerKind::Superbet => {
                affiliate.superbet_affiliate_id = Some(new.external_id.clone())
            }
        }

        let (_, created) = self
            .affiliates
            .create_with_user(&account, &affiliate)
            .await
            .map_err(ledger_error)?;
        Ok(created.id)
    }

    async fn refresh_partner_affiliate(
        &self,
        affiliate_id: Uuid,
        name: &str,
        site_ids: &[i32],
    ) -> Result<(), LedgerError> {
        let timer = QueryTimer::new("refresh_partner_affiliate");
        let result = sqlx::query(
            r#"
            UPDATE affiliates
            SET name = $2, site_ids = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(affiliate_id)
        .bind(name)
        .bind(site_ids)
        .execute(&self.pool)
        .await
        .map_err(ledger_error)?;
        timer.record();

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(affiliate_id.to_string()));
        }
        Ok(())
    }

    async fn affiliate_deal(&self, affiliate_id: Uuid) -> Result<Option<Deal>, LedgerError> {
        Ok(self
            .deals
            .find_for_affiliate(affiliate_id)
            .await
            .map_err(ledger_error)?
            .map(Into::into))
    }

    async fn default_terms(&self) -> Result<DefaultTerms, LedgerError> {
        self.config.default_terms().await.map_err(ledger_error)
    }

    async fn ftd_exists_on(&self, affiliate_id: Uuid, day: &DayWindow) -> Result<bool, LedgerError> {
        let timer = QueryTimer::new("ftd_exists_on_day");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM ftds
                WHERE affiliate_id = $1 AND date >= $2 AND date < $3
            )
            "#,
        )
        .bind(affiliate_id)
        .bind(day.start)
        .bind(day.end)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map_err(ledger_error)
    }

    async fn find_or_create_player(
        &self,
        affiliate_id: Uuid,
        external_id: &str,
    ) -> Result<Uuid, LedgerError> {
        let timer = QueryTimer::new("find_or_create_player");
        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM players
            WHERE affiliate_id = $1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(affiliate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_error)?;

        let id = match existing {
            Some(id) => id,
            None => sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO players (affiliate_id, external_id)
                VALUES ($1, $2)
                RETURNING id
                "#,
            )
            .bind(affiliate_id)
            .bind(external_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ledger_error)?,
        };
        timer.record();
        Ok(id)
    }

    async fn record_ftd(&self, entry: &FtdEntry) -> Result<(), LedgerError> {
        let timer = QueryTimer::new("record_ftd");
        let mut tx = self.pool.begin().await.map_err(ledger_error)?;

        let ftd_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO ftds (affiliate_id, player_id, amount, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(entry.affiliate_id)
        .bind(entry.player_id)
        .bind(Decimal::ZERO)
        .bind(entry.date)
        .fetch_one(&mut *tx)
        .await
        .map_err(ledger_error)?;

        if let Some(cpa) = &entry.cpa {
            sqlx::query(
                r#"
                INSERT INTO commissions (affiliate_id, ftd_id, amount, type, date)
                VALUES ($1, $2, $3, 'CPA', $4)
                "#,
            )
            .bind(entry.affiliate_id)
            .bind(ftd_id)
            .bind(cpa.amount)
            .bind(entry.date)
            .execute(&mut *tx)
            .await
            .map_err(ledger_error)?;

            insert_transaction(
                &mut tx,
                entry.affiliate_id,
                Some(entry.player_id),
                cpa.amount,
                TransactionType::Cpa,
                entry.date,
                &cpa.description,
            )
            .await?;
        }

        tx.commit().await.map_err(ledger_error)?;
        timer.record();
        Ok(())
    }

    async fn rev_share_report_exists(
        &self,
        affiliate_id: Uuid,
        day: &DayWindow,
        campaign_id: Option<&str>,
    ) -> Result<bool, LedgerError> {
        let timer = QueryTimer::new("rev_share_report_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM rev_share_reports
                WHERE affiliate_id = $1 AND date >= $2 AND date < $3
                  AND campaign_id IS NOT DISTINCT FROM $4
            )
            "#,
        )
        .bind(affiliate_id)
        .bind(day.start)
        .bind(day.end)
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map_err(ledger_error)
    }

    async fn record_rev_share(&self, entry: &RevShareEntry) -> Result<(), LedgerError> {
        let timer = QueryTimer::new("record_rev_share");
        let mut tx = self.pool.begin().await.map_err(ledger_error)?;

        sqlx::query(
            r#"
            INSERT INTO rev_share_reports (affiliate_id, date, revenue, percentage, commission, campaign_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.affiliate_id)
        .bind(entry.date)
        .bind(entry.revenue)
        .bind(entry.percentage)
        .bind(entry.commission)
        .bind(&entry.campaign_id)
        .execute(&mut *tx)
        .await
        .map_err(ledger_error)?;

        insert_transaction(
            &mut tx,
            entry.affiliate_id,
            None,
            entry.commission,
            TransactionType::RevenueShare,
            entry.date,
            &entry.description,
        )
        .await?;

        tx.commit().await.map_err(ledger_error)?;
        timer.record();
        Ok(())
    }
}

async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    affiliate_id: Uuid,
    player_id: Option<Uuid>,
    amount: Decimal,
    kind: TransactionType,
    date: chrono::DateTime<chrono::Utc>,
    description: &str,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO transactions (affiliate_id, player_id, amount, type, status, date, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(affiliate_id)
    .bind(player_id)
    .bind(amount)
    .bind(TransactionTypeDb::from(kind))
    .bind(TransactionStatusDb::from(TransactionStatus::Approved))
    .bind(date)
    .bind(description)
    .execute(&mut **tx)
    .await
    .map_err(ledger_error)?;
    Ok(())
}
