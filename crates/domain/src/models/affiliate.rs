//! Affiliate profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

use super::deal::DealSummary;

/// Affiliate lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliateStatus {
    Pending,
    Approved,
    Rejected,
}

impl AffiliateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AffiliateStatus::Pending => "PENDING",
            AffiliateStatus::Approved => "APPROVED",
            AffiliateStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for AffiliateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(AffiliateStatus::Pending),
            "APPROVED" => Ok(AffiliateStatus::Approved),
            "REJECTED" => Ok(AffiliateStatus::Rejected),
            _ => Err(format!("Invalid affiliate status: {}", s)),
        }
    }
}

impl fmt::Display for AffiliateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// OTG affiliate id.
    pub external_id: Option<String>,
    pub site_ids: Vec<i32>,
    pub superbet_affiliate_id: Option<String>,
    pub superbet_affiliate_link: Option<String>,
    pub instagram_link: Option<String>,
    pub facebook_link: Option<String>,
    pub telegram_link: Option<String>,
    pub status: AffiliateStatus,
    pub deal_id: Option<Uuid>,
    pub referred_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Affiliate as returned by the API, with login email and deal summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateResponse {
    #[serde(flatten)]
    pub affiliate: Affiliate,
    pub email: String,
    pub deal: Option<DealSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAffiliateRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub external_id: Option<String>,
    #[validate(url(message = "Invalid link"))]
    pub superbet_affiliate_link: Option<String>,
    pub deal_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSuperbetLinkRequest {
    #[validate(url(message = "Invalid link"))]
    pub superbet_affiliate_link: String,
    #[validate(length(min = 1, max = 64))]
    pub superbet_affiliate_id: Option<String>,
}

/// An empty string clears the link.
fn validate_social_link(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.trim().validate_url() {
        Ok(())
    } else {
        let mut err = ValidationError::new("url");
        err.message = Some("Invalid link".into());
        Err(err)
    }
}

/// Omitted fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSocialLinksRequest {
    #[validate(custom(function = "validate_social_link"))]
    pub instagram_link: Option<String>,
    #[validate(custom(function = "validate_social_link"))]
    pub facebook_link: Option<String>,
    #[validate(custom(function = "validate_social_link"))]
    pub telegram_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAffiliateStatusRequest {
    pub status: AffiliateStatus,
}

/// Public referral self-registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRegisterRequest {
    #[validate(length(min = 1, message = "Referral code is required"))]
    pub referral_code: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStats {
    pub affiliate_id: Uuid,
    pub total_referrals: i64,
    pub approved_referrals: i64,
    pub referrals: Vec<ReferralSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub id: Uuid,
    pub name: String,
    pub status: AffiliateStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            AffiliateStatus::from_str("approved").unwrap(),
            AffiliateStatus::Approved
        );
        assert!(AffiliateStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateAffiliateRequest {
            email: "not-an-email".into(),
            password: "secret1".into(),
            name: "Joana".into(),
            external_id: None,
            superbet_affiliate_link: None,
            deal_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_social_links_accept_blank_and_urls() {
        let req = UpdateSocialLinksRequest {
            instagram_link: Some("https://instagram.com/tipster".into()),
            facebook_link: Some(String::new()),
            telegram_link: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateSocialLinksRequest {
            telegram_link: Some("@tipster".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
