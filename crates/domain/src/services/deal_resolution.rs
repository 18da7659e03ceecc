//! Effective commission terms for an affiliate.
//!
//! An affiliate is paid on its deal's terms only while that deal is active.
//! In every other case (no deal, or an inactive one) the system defaults from
//! `system_config` apply. Callers resolve terms at the moment they compute a
//! commission; nothing here is cached.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::deal::Deal;

/// System-wide fallback terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTerms {
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
}

impl Default for DefaultTerms {
    /// CPA 300, revenue share 25%.
    fn default() -> Self {
        Self {
            cpa_value: Decimal::from(300),
            rev_share_percentage: Decimal::from(25),
        }
    }
}

/// Where the effective terms came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermsSource {
    Deal,
    SystemDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveTerms {
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
    pub source: TermsSource,
}

/// Picks the active deal's terms, else the defaults.
pub fn resolve_terms(deal: Option<&Deal>, defaults: &DefaultTerms) -> EffectiveTerms {
    match deal {
        Some(deal) if deal.active => EffectiveTerms {
            cpa_value: deal.cpa_value,
            rev_share_percentage: deal.rev_share_percentage,
            source: TermsSource::Deal,
        },
        _ => EffectiveTerms {
            cpa_value: defaults.cpa_value,
            rev_share_percentage: defaults.rev_share_percentage,
            source: TermsSource::SystemDefault,
        },
    }
}
