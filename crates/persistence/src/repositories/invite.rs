//! Affiliate invite repository.

use chrono::{DateTime, Utc};
use domain::models::invite::InviteStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{AffiliateInviteEntity, InviteStatusDb};
use crate::metrics::QueryTimer;

const INVITE_COLUMNS: &str = "id, code, email, name, status, expires_at, superbet_request_id, \
     affiliate_id, created_at, updated_at";

/// Invite row to insert.
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub code: String,
    pub email: String,
    pub name: String,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub superbet_request_id: Option<String>,
}

/// Repository for affiliate invite operations.
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, invite: &NewInvite) -> Result<AffiliateInviteEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invite");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            INSERT INTO affiliate_invites (code, email, name, status, expires_at, superbet_request_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(&invite.code)
        .bind(&invite.email)
        .bind(&invite.name)
        .bind(InviteStatusDb::from(invite.status))
        .bind(invite.expires_at)
        .bind(&invite.superbet_request_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invite_by_id");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM affiliate_invites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invite_by_code");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM affiliate_invites WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invite_by_request_id");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            SELECT {INVITE_COLUMNS}
            FROM affiliate_invites
            WHERE superbet_request_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A PENDING invite for this email that has not yet lapsed.
    pub async fn find_open_for_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_open_invite_for_email");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            SELECT {INVITE_COLUMNS}
            FROM affiliate_invites
            WHERE LOWER(email) = LOWER($1) AND status = 'PENDING' AND expires_at > $2
            LIMIT 1
            "#
        ))
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Invites, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<InviteStatus>,
    ) -> Result<Vec<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invites");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            SELECT {INVITE_COLUMNS}
            FROM affiliate_invites
            WHERE ($1::invite_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(status.map(InviteStatusDb::from))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// PENDING invites that are waiting on a Superbet decision.
    pub async fn list_awaiting_partner(&self) -> Result<Vec<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invites_awaiting_partner");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            SELECT {INVITE_COLUMNS}
            FROM affiliate_invites
            WHERE status = 'PENDING' AND superbet_request_id IS NOT NULL
            ORDER BY created_at
            "#
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Moves a PENDING invite to `status`. Returns `None` when the invite
    /// was no longer PENDING.
    pub async fn transition_from_pending(
        &self,
        id: Uuid,
        status: InviteStatus,
    ) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_invite_from_pending");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            UPDATE affiliate_invites
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(InviteStatusDb::from(status))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Expires lapsed PENDING invites that never reached Superbet.
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("expire_lapsed_invites");
        let result = sqlx::query(
            r#"
            UPDATE affiliate_invites
            SET status = 'EXPIRED', updated_at = NOW()
            WHERE status = 'PENDING' AND expires_at < $1 AND superbet_request_id IS NULL
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    pub async fn set_request_id(
        &self,
        id: Uuid,
        request_id: &str,
    ) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_invite_request_id");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            UPDATE affiliate_invites
            SET superbet_request_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Links the invite to its affiliate and sets the status in one write.
    pub async fn link_affiliate(
        &self,
        id: Uuid,
        affiliate_id: Uuid,
        status: InviteStatus,
    ) -> Result<Option<AffiliateInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("link_invite_affiliate");
        let result = sqlx::query_as::<_, AffiliateInviteEntity>(&format!(
            r#"
            UPDATE affiliate_invites
            SET affiliate_id = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(affiliate_id)
        .bind(InviteStatusDb::from(status))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
