//! Commercial deals overriding the default CPA and revenue-share terms.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Name of the shared fallback deal reused during onboarding.
pub const STANDARD_DEAL_NAME: &str = "Deal Padrão";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    pub name: String,
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
    pub active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a deal that is about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub name: String,
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
    pub active: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealSummary {
    pub id: Uuid,
    pub name: String,
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
    pub active: bool,
}

impl From<&Deal> for DealSummary {
    fn from(deal: &Deal) -> Self {
        Self {
            id: deal.id,
            name: deal.name.clone(),
            cpa_value: deal.cpa_value,
            rev_share_percentage: deal.rev_share_percentage,
            active: deal.active,
        }
    }
}

/// Affiliate reference listed under a deal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAffiliate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealWithAffiliates {
    #[serde(flatten)]
    pub deal: Deal,
    pub affiliates: Vec<DealAffiliate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub cpa_value: Decimal,
    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub rev_share_percentage: Decimal,
    pub active: Option<bool>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

impl From<CreateDealRequest> for NewDeal {
    fn from(req: CreateDealRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            cpa_value: req.cpa_value,
            rev_share_percentage: req.rev_share_percentage,
            active: req.active.unwrap_or(true),
            description: req.description,
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: Option<String>,
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub cpa_value: Option<Decimal>,
    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub rev_share_percentage: Option<Decimal>,
    pub active: Option<bool>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

/// Credentials handed out when a deal is associated with an affiliate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAssociationResponse {
    pub affiliate_id: Uuid,
    pub deal: DealSummary,
    pub credentials: AffiliateCredentials,
    pub referral_link: Option<String>,
}
