//! Affiliate repository.
//!
//! Creating an affiliate touches two tables that reference each other
//! (`affiliates.user_id` and `users.affiliate_id`), so every create runs
//! inside one transaction.

use domain::models::affiliate::AffiliateStatus;
use domain::models::Role;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::{
    AffiliateEntity, AffiliateStatusDb, AffiliateWithEmailEntity, ReferralEntity, UserEntity,
    UserRoleDb,
};
use crate::metrics::QueryTimer;

const AFFILIATE_COLUMNS: &str = "a.id, a.user_id, a.name, a.external_id, a.site_ids, \
     a.superbet_affiliate_id, a.superbet_affiliate_link, a.instagram_link, a.facebook_link, \
     a.telegram_link, a.status, a.deal_id, a.referred_by_id, a.created_at, a.updated_at";

/// Login for a new affiliate user.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Affiliate row to insert.
#[derive(Debug, Clone)]
pub struct NewAffiliate {
    pub name: String,
    pub external_id: Option<String>,
    pub site_ids: Vec<i32>,
    pub superbet_affiliate_id: Option<String>,
    pub superbet_affiliate_link: Option<String>,
    pub status: AffiliateStatus,
    pub deal_id: Option<Uuid>,
    pub referred_by_id: Option<Uuid>,
}

impl NewAffiliate {
    pub fn named(name: impl Into<String>, status: AffiliateStatus) -> Self {
        Self {
            name: name.into(),
            external_id: None,
            site_ids: Vec::new(),
            superbet_affiliate_id: None,
            superbet_affiliate_link: None,
            status,
            deal_id: None,
            referred_by_id: None,
        }
    }
}

/// Repository for affiliate database operations.
#[derive(Clone)]
pub struct AffiliateRepository {
    pool: PgPool,
}

impl AffiliateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_affiliate_by_id");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            "SELECT {AFFILIATE_COLUMNS} FROM affiliates a WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_affiliate_by_user_id");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            "SELECT {AFFILIATE_COLUMNS} FROM affiliates a WHERE a.user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Affiliate plus its login email.
    pub async fn find_with_email(
        &self,
        id: Uuid,
    ) -> Result<Option<AffiliateWithEmailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_affiliate_with_email");
        let result = sqlx::query_as::<_, AffiliateWithEmailEntity>(&format!(
            r#"
            SELECT {AFFILIATE_COLUMNS}, u.email
            FROM affiliates a
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All affiliates, newest first.
    pub async fn list_with_email(&self) -> Result<Vec<AffiliateWithEmailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_affiliates_with_email");
        let result = sqlx::query_as::<_, AffiliateWithEmailEntity>(&format!(
            r#"
            SELECT {AFFILIATE_COLUMNS}, u.email
            FROM affiliates a
            JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Affiliate by either its id or its OTG external id.
    pub async fn find_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_affiliate_by_referral_code");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            r#"
            SELECT {AFFILIATE_COLUMNS}
            FROM affiliates a
            WHERE a.id::text = $1 OR a.external_id = $1
            LIMIT 1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Creates user, affiliate and the user back-reference atomically.
    pub async fn create_with_user(
        &self,
        account: &NewAccount,
        affiliate: &NewAffiliate,
    ) -> Result<(UserEntity, AffiliateEntity), sqlx::Error> {
        let timer = QueryTimer::new("create_affiliate_with_user");
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, role, affiliate_id, created_at, updated_at
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(UserRoleDb::from(Role::Affiliate))
        .fetch_one(&mut *tx)
        .await?;

        let created = insert_affiliate(&mut tx, user.id, affiliate).await?;
        let user = backfill_user(&mut tx, user.id, created.id).await?;

        tx.commit().await?;
        timer.record();
        Ok((user, created))
    }

    /// Creates an affiliate for an existing user and backfills the user.
    pub async fn create_for_user(
        &self,
        user_id: Uuid,
        affiliate: &NewAffiliate,
    ) -> Result<AffiliateEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_affiliate_for_user");
        let mut tx = self.pool.begin().await?;
        let created = insert_affiliate(&mut tx, user_id, affiliate).await?;
        backfill_user(&mut tx, user_id, created.id).await?;
        tx.commit().await?;
        timer.record();
        Ok(created)
    }

    /// Sets the Superbet link, and the Superbet id when one is given.
    pub async fn update_superbet_link(
        &self,
        id: Uuid,
        link: &str,
        superbet_affiliate_id: Option<&str>,
    ) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_affiliate_superbet_link");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            r#"
            UPDATE affiliates a
            SET superbet_affiliate_link = $2,
                superbet_affiliate_id = COALESCE($3, a.superbet_affiliate_id),
                updated_at = NOW()
            WHERE a.id = $1
            RETURNING {AFFILIATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(link)
        .bind(superbet_affiliate_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// `None` leaves a link untouched; an empty string clears it.
    pub async fn update_social_links(
        &self,
        id: Uuid,
        instagram: Option<&str>,
        facebook: Option<&str>,
        telegram: Option<&str>,
    ) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_affiliate_social_links");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            r#"
            UPDATE affiliates a
            SET instagram_link = CASE WHEN $2::text IS NULL THEN a.instagram_link ELSE NULLIF($2, '') END,
                facebook_link = CASE WHEN $3::text IS NULL THEN a.facebook_link ELSE NULLIF($3, '') END,
                telegram_link = CASE WHEN $4::text IS NULL THEN a.telegram_link ELSE NULLIF($4, '') END,
                updated_at = NOW()
            WHERE a.id = $1
            RETURNING {AFFILIATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(instagram)
        .bind(facebook)
        .bind(telegram)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: AffiliateStatus,
    ) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_affiliate_status");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            r#"
            UPDATE affiliates a
            SET status = $2, updated_at = NOW()
            WHERE a.id = $1
            RETURNING {AFFILIATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(AffiliateStatusDb::from(status))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Associates (`Some`) or clears (`None`) the affiliate's deal.
    pub async fn set_deal(
        &self,
        id: Uuid,
        deal_id: Option<Uuid>,
    ) -> Result<Option<AffiliateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_affiliate_deal");
        let result = sqlx::query_as::<_, AffiliateEntity>(&format!(
            r#"
            UPDATE affiliates a
            SET deal_id = $2, updated_at = NOW()
            WHERE a.id = $1
            RETURNING {AFFILIATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(deal_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Affiliates referred by `referrer_id`, newest first.
    pub async fn list_referrals(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<ReferralEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_affiliate_referrals");
        let result = sqlx::query_as::<_, ReferralEntity>(
            r#"
            SELECT id, name, status, created_at
            FROM affiliates
            WHERE referred_by_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Ids of the affiliates referred by `referrer_id`.
    pub async fn referral_ids(&self, referrer_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("affiliate_referral_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM affiliates WHERE referred_by_id = $1
            "#,
        )
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

pub(crate) async fn insert_affiliate(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    affiliate: &NewAffiliate,
) -> Result<AffiliateEntity, sqlx::Error> {
    sqlx::query_as::<_, AffiliateEntity>(&format!(
        r#"
        INSERT INTO affiliates AS a (user_id, name, external_id, site_ids, superbet_affiliate_id,
                                     superbet_affiliate_link, status, deal_id, referred_by_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {AFFILIATE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&affiliate.name)
    .bind(&affiliate.external_id)
    .bind(&affiliate.site_ids)
    .bind(&affiliate.superbet_affiliate_id)
    .bind(&affiliate.superbet_affiliate_link)
    .bind(AffiliateStatusDb::from(affiliate.status))
    .bind(affiliate.deal_id)
    .bind(affiliate.referred_by_id)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn backfill_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    affiliate_id: Uuid,
) -> Result<UserEntity, sqlx::Error> {
    sqlx::query_as::<_, UserEntity>(
        r#"
        UPDATE users
        SET affiliate_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, email, password_hash, name, role, affiliate_id, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(affiliate_id)
    .fetch_one(&mut **tx)
    .await
}
