//! Affiliate onboarding invites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::affiliate::AffiliateStatus;
use super::deal::DealSummary;

pub const DEFAULT_INVITE_EXPIRY_DAYS: i64 = 7;

/// Expiry given to invites synthesised from partner webhooks.
pub const WEBHOOK_INVITE_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "PENDING",
            InviteStatus::Approved => "APPROVED",
            InviteStatus::Rejected => "REJECTED",
            InviteStatus::Expired => "EXPIRED",
        }
    }
}

impl FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(InviteStatus::Pending),
            "APPROVED" => Ok(InviteStatus::Approved),
            "REJECTED" => Ok(InviteStatus::Rejected),
            "EXPIRED" => Ok(InviteStatus::Expired),
            _ => Err(format!("Invalid invite status: {}", s)),
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateInvite {
    pub id: Uuid,
    pub code: String,
    pub email: String,
    pub name: String,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub superbet_request_id: Option<String>,
    pub affiliate_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
    #[validate(range(min = 1, max = 90, message = "expiresInDays must be between 1 and 90"))]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    #[serde(flatten)]
    pub invite: AffiliateInvite,
    pub registration_link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListInvitesQuery {
    pub status: Option<InviteStatus>,
}

/// Affiliate created from an invite, as shown in admin listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteAffiliateInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: AffiliateStatus,
    pub superbet_affiliate_link: Option<String>,
    pub deal: Option<DealSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteListItem {
    #[serde(flatten)]
    pub invite: AffiliateInvite,
    pub affiliate: Option<InviteAffiliateInfo>,
}

/// What an unauthenticated visitor sees for an invite code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInvite {
    pub code: String,
    pub email: String,
    pub name: String,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
}

impl From<&AffiliateInvite> for PublicInvite {
    fn from(invite: &AffiliateInvite) -> Self {
        Self {
            code: invite.code.clone(),
            email: invite.email.clone(),
            name: invite.name.clone(),
            status: invite.status,
            expires_at: invite.expires_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteRegisterRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 128))]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRegistrationResponse {
    pub status: InviteStatus,
    pub message: String,
    pub request_id: Option<String>,
    pub affiliate_id: Option<Uuid>,
    pub affiliate_link: Option<String>,
}

/// Outcome of polling the partner for pending invites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvitesSummary {
    pub expired: u64,
    pub checked: u64,
    pub approved: u64,
    pub rejected: u64,
    pub failed: u64,
}
