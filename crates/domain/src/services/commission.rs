//! Commission arithmetic and calendar helpers used by reconciliation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// `revenue * percentage / 100`, rounded half away from zero to cents.
///
/// `None` when the product does not fit in a `Decimal`.
pub fn rev_share_commission(revenue: Decimal, percentage: Decimal) -> Option<Decimal> {
    revenue
        .checked_mul(percentage)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(|c| c.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// A UTC calendar day as the half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
        Self {
            day,
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn of(instant: DateTime<Utc>) -> Self {
        Self::for_day(instant.date_naive())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Parses a partner row date: `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_row_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(day) = shared::validation::parse_date(raw) {
        return Some(day.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Rolling sync window ending today: `(today - days, today)`.
pub fn rolling_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(i64::from(days)), today)
}

pub fn cpa_description(campaign: Option<&str>) -> String {
    format!("CPA - {}", campaign.unwrap_or("N/A"))
}

pub fn rev_share_description(campaign: Option<&str>) -> String {
    format!("Revenue Share - {}", campaign.unwrap_or("N/A"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rev_share_commission_quarter_of_thousand() {
        let commission = rev_share_commission(Decimal::from(1000), Decimal::from(25));
        assert_eq!(commission, Some(Decimal::new(25000, 2)));
    }

    #[test]
    fn test_rev_share_commission_rounds_to_cents() {
        // 333.33 * 12.5% = 41.66625
        let commission = rev_share_commission(Decimal::new(33333, 2), Decimal::new(125, 1));
        assert_eq!(commission, Some(Decimal::new(4167, 2)));
    }

    #[test]
    fn test_rev_share_commission_negative_revenue() {
        let commission = rev_share_commission(Decimal::from(-200), Decimal::from(25)).unwrap();
        assert_eq!(commission, Decimal::from(-50));
        assert!(commission <= Decimal::ZERO);
    }

    #[test]
    fn test_rev_share_commission_overflow_is_none() {
        assert_eq!(rev_share_commission(Decimal::MAX, Decimal::from(25)), None);
        assert_eq!(rev_share_commission(Decimal::MIN, Decimal::from(40)), None);
    }

    #[test]
    fn test_day_window() {
        let window = DayWindow::for_day(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_parse_row_date() {
        assert_eq!(
            parse_row_date("2024-05-02"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_row_date("2024-05-02T22:30:00-03:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 3, 1, 30, 0).unwrap())
        );
        assert_eq!(parse_row_date("yesterday"), None);
    }

    #[test]
    fn test_rolling_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = rolling_window(today, 30);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(end, today);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(cpa_description(Some("Copa")), "CPA - Copa");
        assert_eq!(rev_share_description(None), "Revenue Share - N/A");
    }
}
