//! Persistence contract used by reconciliation and affiliate sync.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::deal::Deal;
use crate::models::partner::PartnerKind;
use crate::services::commission::DayWindow;
use crate::services::deal_resolution::DefaultTerms;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("duplicate record: {0}")]
    Conflict(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Local affiliate matched to a partner id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAffiliate {
    pub id: Uuid,
    pub name: String,
    pub external_id: String,
}

/// User + affiliate pair to create for a partner affiliate.
#[derive(Debug, Clone)]
pub struct NewPartnerAffiliate {
    pub external_id: String,
    pub name: String,
    pub site_ids: Vec<i32>,
    pub email: String,
    pub password_hash: String,
}

/// CPA payout attached to an FTD.
#[derive(Debug, Clone, PartialEq)]
pub struct CpaPayout {
    pub amount: Decimal,
    pub description: String,
}

/// FTD plus its optional CPA commission and ledger transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FtdEntry {
    pub affiliate_id: Uuid,
    pub player_id: Uuid,
    pub date: DateTime<Utc>,
    pub cpa: Option<CpaPayout>,
}

/// Revenue-share report plus its ledger transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RevShareEntry {
    pub affiliate_id: Uuid,
    pub date: DateTime<Utc>,
    pub revenue: Decimal,
    pub percentage: Decimal,
    pub commission: Decimal,
    pub campaign_id: Option<String>,
    pub description: String,
}

/// Storage operations needed to reconcile partner data.
///
/// `record_ftd` and `record_rev_share` must write all their rows atomically.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_partner_affiliate(
        &self,
        partner: PartnerKind,
        external_id: &str,
    ) -> Result<Option<LinkedAffiliate>, LedgerError>;

    /// Creates user, affiliate and the user back-reference as one unit.
    async fn create_partner_affiliate(
        &self,
        partner: PartnerKind,
        new: &NewPartnerAffiliate,
    ) -> Result<Uuid, LedgerError>;

    /// Overwrites name and site ids only.
    async fn refresh_partner_affiliate(
        &self,
        affiliate_id: Uuid,
        name: &str,
        site_ids: &[i32],
    ) -> Result<(), LedgerError>;

    async fn affiliate_deal(&self, affiliate_id: Uuid) -> Result<Option<Deal>, LedgerError>;

    /// Current system defaults, read fresh on every call.
    async fn default_terms(&self) -> Result<DefaultTerms, LedgerError>;

    async fn ftd_exists_on(&self, affiliate_id: Uuid, day: &DayWindow) -> Result<bool, LedgerError>;

    /// Returns the affiliate's player, creating one with `external_id` if none exists.
    async fn find_or_create_player(
        &self,
        affiliate_id: Uuid,
        external_id: &str,
    ) -> Result<Uuid, LedgerError>;

    async fn record_ftd(&self, entry: &FtdEntry) -> Result<(), LedgerError>;

    async fn rev_share_report_exists(
        &self,
        affiliate_id: Uuid,
        day: &DayWindow,
        campaign_id: Option<&str>,
    ) -> Result<bool, LedgerError>;

    async fn record_rev_share(&self, entry: &RevShareEntry) -> Result<(), LedgerError>;
}
