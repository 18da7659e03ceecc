//! Affiliate entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::affiliate::{Affiliate, AffiliateStatus, ReferralSummary};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for affiliate_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "affiliate_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliateStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<AffiliateStatusDb> for AffiliateStatus {
    fn from(db: AffiliateStatusDb) -> Self {
        match db {
            AffiliateStatusDb::Pending => AffiliateStatus::Pending,
            AffiliateStatusDb::Approved => AffiliateStatus::Approved,
            AffiliateStatusDb::Rejected => AffiliateStatus::Rejected,
        }
    }
}

impl From<AffiliateStatus> for AffiliateStatusDb {
    fn from(status: AffiliateStatus) -> Self {
        match status {
            AffiliateStatus::Pending => AffiliateStatusDb::Pending,
            AffiliateStatus::Approved => AffiliateStatusDb::Approved,
            AffiliateStatus::Rejected => AffiliateStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the affiliates table.
#[derive(Debug, Clone, FromRow)]
pub struct AffiliateEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub external_id: Option<String>,
    pub site_ids: Vec<i32>,
    pub superbet_affiliate_id: Option<String>,
    pub superbet_affiliate_link: Option<String>,
    pub instagram_link: Option<String>,
    pub facebook_link: Option<String>,
    pub telegram_link: Option<String>,
    pub status: AffiliateStatusDb,
    pub deal_id: Option<Uuid>,
    pub referred_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AffiliateEntity> for Affiliate {
    fn from(entity: AffiliateEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            name: entity.name,
            external_id: entity.external_id,
            site_ids: entity.site_ids,
            superbet_affiliate_id: entity.superbet_affiliate_id,
            superbet_affiliate_link: entity.superbet_affiliate_link,
            instagram_link: entity.instagram_link,
            facebook_link: entity.facebook_link,
            telegram_link: entity.telegram_link,
            status: entity.status.into(),
            deal_id: entity.deal_id,
            referred_by_id: entity.referred_by_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Affiliate joined with its user's email.
#[derive(Debug, Clone, FromRow)]
pub struct AffiliateWithEmailEntity {
    #[sqlx(flatten)]
    pub affiliate: AffiliateEntity,
    pub email: String,
}

/// Row for the referral listing.
#[derive(Debug, Clone, FromRow)]
pub struct ReferralEntity {
    pub id: Uuid,
    pub name: String,
    pub status: AffiliateStatusDb,
    pub created_at: DateTime<Utc>,
}

impl From<ReferralEntity> for ReferralSummary {
    fn from(entity: ReferralEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            status: entity.status.into(),
            created_at: entity.created_at,
        }
    }
}
