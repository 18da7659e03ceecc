//! Aggregate rows for dashboard queries.

use domain::models::dashboard::{AffiliatePerformance, LedgerTotals};
use domain::services::{resolve_terms, DefaultTerms, EffectiveTerms, TermsSource};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::affiliate::AffiliateStatusDb;

/// Ledger totals over a date range.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerTotalsEntity {
    pub total_ftds: i64,
    pub cpa_count: i64,
    pub cpa_total: Decimal,
    pub rev_share_total: Decimal,
}

impl From<LedgerTotalsEntity> for LedgerTotals {
    fn from(entity: LedgerTotalsEntity) -> Self {
        Self {
            total_ftds: entity.total_ftds,
            cpa_count: entity.cpa_count,
            cpa_total: entity.cpa_total,
            rev_share_total: entity.rev_share_total,
        }
    }
}

/// Per-affiliate totals with the affiliate's deal columns.
#[derive(Debug, Clone, FromRow)]
pub struct AffiliatePerformanceEntity {
    pub affiliate_id: Uuid,
    pub name: String,
    pub status: AffiliateStatusDb,
    pub referred_by_id: Option<Uuid>,
    pub deal_name: Option<String>,
    pub deal_cpa_value: Option<Decimal>,
    pub deal_rev_share_percentage: Option<Decimal>,
    pub deal_active: Option<bool>,
    #[sqlx(flatten)]
    pub totals: LedgerTotalsEntity,
}

impl AffiliatePerformanceEntity {
    /// The deal's terms while it is active, else `defaults`.
    pub fn terms(&self, defaults: &DefaultTerms) -> EffectiveTerms {
        match (
            self.deal_active,
            self.deal_cpa_value,
            self.deal_rev_share_percentage,
        ) {
            (Some(true), Some(cpa_value), Some(rev_share_percentage)) => EffectiveTerms {
                cpa_value,
                rev_share_percentage,
                source: TermsSource::Deal,
            },
            _ => resolve_terms(None, defaults),
        }
    }

    pub fn into_performance(self, defaults: &DefaultTerms) -> AffiliatePerformance {
        let terms = self.terms(defaults);
        let totals = LedgerTotals::from(self.totals);
        AffiliatePerformance {
            affiliate_id: self.affiliate_id,
            name: self.name,
            status: self.status.into(),
            referred_by_id: self.referred_by_id,
            total_earnings: totals.total_earnings(),
            totals,
            terms,
            deal_name: self.deal_name,
        }
    }
}
