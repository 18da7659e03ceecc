//! Deal entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::deal::{Deal, DealAffiliate};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the deals table.
#[derive(Debug, Clone, FromRow)]
pub struct DealEntity {
    pub id: Uuid,
    pub name: String,
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
    pub active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DealEntity> for Deal {
    fn from(entity: DealEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            cpa_value: entity.cpa_value,
            rev_share_percentage: entity.rev_share_percentage,
            active: entity.active,
            description: entity.description,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Affiliate attached to a deal, as listed on the deal.
#[derive(Debug, Clone, FromRow)]
pub struct DealAffiliateEntity {
    pub deal_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<DealAffiliateEntity> for DealAffiliate {
    fn from(entity: DealAffiliateEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
        }
    }
}
