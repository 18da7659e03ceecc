//! Affiliate invite entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::invite::{AffiliateInvite, InviteStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for invite_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invite_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatusDb {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl From<InviteStatusDb> for InviteStatus {
    fn from(db: InviteStatusDb) -> Self {
        match db {
            InviteStatusDb::Pending => InviteStatus::Pending,
            InviteStatusDb::Approved => InviteStatus::Approved,
            InviteStatusDb::Rejected => InviteStatus::Rejected,
            InviteStatusDb::Expired => InviteStatus::Expired,
        }
    }
}

impl From<InviteStatus> for InviteStatusDb {
    fn from(status: InviteStatus) -> Self {
        match status {
            InviteStatus::Pending => InviteStatusDb::Pending,
            InviteStatus::Approved => InviteStatusDb::Approved,
            InviteStatus::Rejected => InviteStatusDb::Rejected,
            InviteStatus::Expired => InviteStatusDb::Expired,
        }
    }
}

/// Database row mapping for the affiliate_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct AffiliateInviteEntity {
    pub id: Uuid,
    pub code: String,
    pub email: String,
    pub name: String,
    pub status: InviteStatusDb,
    pub expires_at: DateTime<Utc>,
    pub superbet_request_id: Option<String>,
    pub affiliate_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AffiliateInviteEntity> for AffiliateInvite {
    fn from(entity: AffiliateInviteEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            email: entity.email,
            name: entity.name,
            status: entity.status.into(),
            expires_at: entity.expires_at,
            superbet_request_id: entity.superbet_request_id,
            affiliate_id: entity.affiliate_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
