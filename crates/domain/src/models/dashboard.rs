//! Reporting views over the reconciled ledger.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::pagination::PageMeta;
use uuid::Uuid;
use validator::Validate;

use super::affiliate::AffiliateStatus;
use super::ledger::{TransactionStatus, TransactionView};
use crate::services::deal_resolution::EffectiveTerms;

/// Half-open `[from, until)` UTC interval built from inclusive calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateBounds {
    /// Builds bounds from optional `YYYY-MM-DD` strings. The end day is inclusive.
    pub fn from_days(start: Option<&str>, end: Option<&str>) -> Result<Self, String> {
        let parse = |value: &str| {
            shared::validation::parse_date(value)
                .ok_or_else(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
        };
        let from = start
            .map(parse)
            .transpose()?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let until = end
            .map(parse)
            .transpose()?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc() + Duration::days(1));

        if let (Some(from), Some(until)) = (from, until) {
            if from >= until {
                return Err("startDate must not be after endDate".to_string());
            }
        }
        Ok(Self { from, until })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(alias = "start_date")]
    #[validate(custom(function = "shared::validation::validate_date"))]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    #[validate(custom(function = "shared::validation::validate_date"))]
    pub end_date: Option<String>,
    #[serde(alias = "affiliate_id")]
    pub affiliate_id: Option<Uuid>,
}

impl DashboardQuery {
    pub fn bounds(&self) -> Result<DateBounds, String> {
        DateBounds::from_days(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

/// Ledger totals for one scope (everything, or one affiliate).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub total_ftds: i64,
    pub cpa_count: i64,
    pub cpa_total: Decimal,
    pub rev_share_total: Decimal,
}

impl LedgerTotals {
    pub fn total_earnings(&self) -> Decimal {
        self.cpa_total + self.rev_share_total
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub totals: LedgerTotals,
    pub total_earnings: Decimal,
    pub total_affiliates: i64,
    /// Effective terms of the affiliate in scope, if any.
    pub terms: Option<EffectiveTerms>,
    pub deal_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliatePerformance {
    pub affiliate_id: Uuid,
    pub name: String,
    pub status: AffiliateStatus,
    pub referred_by_id: Option<Uuid>,
    #[serde(flatten)]
    pub totals: LedgerTotals,
    pub total_earnings: Decimal,
    pub terms: EffectiveTerms,
    pub deal_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    #[serde(alias = "start_date")]
    #[validate(custom(function = "shared::validation::validate_date"))]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    #[validate(custom(function = "shared::validation::validate_date"))]
    pub end_date: Option<String>,
    pub status: Option<TransactionStatus>,
    #[serde(alias = "affiliate_id")]
    pub affiliate_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsPage {
    pub data: Vec<TransactionView>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_bounds_end_is_inclusive() {
        let bounds = DateBounds::from_days(Some("2024-05-01"), Some("2024-05-31")).unwrap();
        assert_eq!(
            bounds.from,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            bounds.until,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_date_bounds_single_day() {
        let bounds = DateBounds::from_days(Some("2024-05-01"), Some("2024-05-01")).unwrap();
        assert!(bounds.from < bounds.until);
    }

    #[test]
    fn test_date_bounds_rejects_inverted_range() {
        assert!(DateBounds::from_days(Some("2024-05-02"), Some("2024-05-01")).is_err());
        assert!(DateBounds::from_days(Some("05/01/2024"), None).is_err());
    }

    #[test]
    fn test_date_bounds_open() {
        assert_eq!(DateBounds::from_days(None, None).unwrap(), DateBounds::default());
    }

    #[test]
    fn test_totals_earnings() {
        let totals = LedgerTotals {
            total_ftds: 2,
            cpa_count: 1,
            cpa_total: Decimal::from(300),
            rev_share_total: Decimal::from(400),
        };
        assert_eq!(totals.total_earnings(), Decimal::from(700));
    }
}
