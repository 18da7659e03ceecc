//! Data exchanged with the partner platforms (OTG and Superbet).
//!
//! Partner payloads are loosely typed: ids arrive as numbers or strings and
//! counters sometimes as numeric strings. The deserializers in [`lenient`]
//! absorb that at the boundary so the rest of the crate sees plain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum page size accepted by the partner results endpoints.
pub const MAX_RESULTS_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerKind {
    Otg,
    Superbet,
}

impl PartnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerKind::Otg => "otg",
            PartnerKind::Superbet => "superbet",
        }
    }

    /// Login email given to users created by affiliate sync.
    pub fn placeholder_email(&self, external_id: &str) -> String {
        format!("affiliate_{}@{}.local", external_id, self.as_str())
    }
}

impl FromStr for PartnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "otg" => Ok(PartnerKind::Otg),
            "superbet" => Ok(PartnerKind::Superbet),
            _ => Err(format!("Unknown partner: {}", s)),
        }
    }
}

impl fmt::Display for PartnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by partner adapters.
#[derive(Debug, Error)]
pub enum PartnerError {
    #[error("{0} API key is not configured")]
    NotConfigured(PartnerKind),

    #[error("{0} rejected the API key (invalid credentials)")]
    InvalidCredentials(PartnerKind),

    #[error("{partner} rejected the request: {message}")]
    BadRequest {
        partner: PartnerKind,
        message: String,
    },

    #[error("{0} resource not found")]
    NotFound(PartnerKind),

    #[error("{partner} returned HTTP {status}")]
    Upstream { partner: PartnerKind, status: u16 },

    #[error("{partner} is unreachable: {message}")]
    Unreachable {
        partner: PartnerKind,
        message: String,
    },

    #[error("{partner} returned an unreadable response: {message}")]
    InvalidResponse {
        partner: PartnerKind,
        message: String,
    },

    #[error("Invalid partner query: {0}")]
    InvalidQuery(String),
}

/// Affiliate as listed by a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerAffiliate {
    #[serde(alias = "affiliateId", deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::int_list")]
    pub site_ids: Vec<i32>,
}

impl PartnerAffiliate {
    /// Display name, falling back to the partner id.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Affiliate {}", self.id),
        }
    }
}

/// One aggregated performance row (affiliate x campaign x day).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "affiliateId", deserialize_with = "lenient::string")]
    pub affiliate_id: String,
    #[serde(rename = "affiliateName", default)]
    pub affiliate_name: Option<String>,
    #[serde(rename = "campaignName", default)]
    pub campaign_name: Option<String>,
    pub date: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub lucro_tipster: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cpa: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub rvs: Decimal,
    #[serde(default, deserialize_with = "lenient::count")]
    pub registrations: i64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub first_deposits: i64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub qualified_cpa: i64,
}

impl ResultRow {
    /// Campaign label, treating blank names as absent.
    pub fn campaign(&self) -> Option<&str> {
        self.campaign_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Paging metadata reported by the partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPageMeta {
    #[serde(default, alias = "current_page", deserialize_with = "lenient::count")]
    pub current_page: i64,
    #[serde(default, alias = "total_pages", deserialize_with = "lenient::count")]
    pub total_pages: i64,
    #[serde(default, alias = "total_rows", deserialize_with = "lenient::count")]
    pub total_rows: i64,
    #[serde(default, alias = "page_size", deserialize_with = "lenient::count")]
    pub page_size: i64,
}

/// A page of results after envelope normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsPage {
    pub rows: Vec<ResultRow>,
    pub meta: Option<PartnerPageMeta>,
}

impl ResultsPage {
    /// Whether another page should be requested after `requested_page`.
    ///
    /// Without metadata there is no way to know, so paging stops.
    pub fn has_more_after(&self, requested_page: u32) -> bool {
        match self.meta {
            Some(meta) => i64::from(requested_page) < meta.total_pages,
            None => false,
        }
    }
}

/// Results request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub affiliate_ids: Vec<String>,
    pub campaign_ids: Vec<String>,
    pub page: u32,
    pub limit: u32,
    pub group_by: Option<String>,
}

impl ResultsQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, limit: u32) -> Result<Self, PartnerError> {
        if start_date > end_date {
            return Err(PartnerError::InvalidQuery(format!(
                "startDate {} is after endDate {}",
                start_date, end_date
            )));
        }
        if limit == 0 || limit > MAX_RESULTS_PAGE_SIZE {
            return Err(PartnerError::InvalidQuery(format!(
                "limit must be between 1 and {}",
                MAX_RESULTS_PAGE_SIZE
            )));
        }
        Ok(Self {
            start_date,
            end_date,
            affiliate_ids: Vec::new(),
            campaign_ids: Vec::new(),
            page: 1,
            limit,
            group_by: None,
        })
    }

    /// Builds a query from `YYYY-MM-DD` strings, rejecting anything else.
    pub fn from_date_strings(start: &str, end: &str, limit: u32) -> Result<Self, PartnerError> {
        let parse = |label: &str, value: &str| {
            shared::validation::parse_date(value).ok_or_else(|| {
                PartnerError::InvalidQuery(format!("{} must be YYYY-MM-DD, got '{}'", label, value))
            })
        };
        Self::new(parse("startDate", start)?, parse("endDate", end)?, limit)
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Query-string pairs; list filters use the `name[]` convention.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("startDate".to_string(), self.start_date.format("%Y-%m-%d").to_string()),
            ("endDate".to_string(), self.end_date.format("%Y-%m-%d").to_string()),
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(group_by) = &self.group_by {
            pairs.push(("groupBy".to_string(), group_by.clone()));
        }
        for id in &self.affiliate_ids {
            pairs.push(("affiliateIds[]".to_string(), id.clone()));
        }
        for id in &self.campaign_ids {
            pairs.push(("campaignIds[]".to_string(), id.clone()));
        }
        pairs
    }
}

/// Registration submitted to Superbet on behalf of an invitee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationState {
    /// Case-insensitive parse; anything unrecognised counts as still pending.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "approved" => RegistrationState::Approved,
            "rejected" => RegistrationState::Rejected,
            _ => RegistrationState::Pending,
        }
    }
}

/// Registration request state reported by Superbet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
    #[serde(deserialize_with = "lenient::string")]
    pub request_id: String,
    #[serde(deserialize_with = "lenient::registration_state")]
    pub status: RegistrationState,
    #[serde(default)]
    pub affiliate_link: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub affiliate_id: Option<String>,
}

/// Approval notification posted by Superbet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperbetWebhookPayload {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub request_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub affiliate_id: Option<String>,
    #[serde(default)]
    pub affiliate_link: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl SuperbetWebhookPayload {
    pub fn state(&self) -> RegistrationState {
        self.status
            .as_deref()
            .map(RegistrationState::parse_lenient)
            .unwrap_or(RegistrationState::Pending)
    }
}

pub(crate) mod lenient {
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use rust_decimal::Decimal;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::RegistrationState;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let value = Value::deserialize(d)?;
        value_to_string(value).ok_or_else(|| D::Error::custom("expected string or number id"))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.and_then(value_to_string).filter(|s| !s.is_empty()))
    }

    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(Decimal::ZERO),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(Decimal::from(i))
                } else {
                    n.to_string()
                        .parse::<Decimal>()
                        .ok()
                        .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                        .ok_or_else(|| D::Error::custom(format!("number out of range: {}", n)))
                }
            }
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Decimal::ZERO),
            Some(Value::String(s)) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|_| D::Error::custom(format!("not a number: {}", s))),
            Some(Value::Bool(b)) => Ok(if b { Decimal::ONE } else { Decimal::ZERO }),
            Some(other) => Err(D::Error::custom(format!("not a number: {}", other))),
        }
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let value = decimal(d)?;
        value
            .trunc()
            .to_i64()
            .ok_or_else(|| D::Error::custom("count out of range"))
    }

    pub fn int_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i32>, D::Error> {
        let values = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
        Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Value::Number(n) => n.as_i64().and_then(|i| i32::try_from(i).ok()),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect())
    }

    pub fn registration_state<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<RegistrationState, D::Error> {
        let value = Option::<String>::deserialize(d)?;
        Ok(value
            .as_deref()
            .map(RegistrationState::parse_lenient)
            .unwrap_or(RegistrationState::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_row_accepts_numeric_strings_and_ids() {
        let row: ResultRow = serde_json::from_value(json!({
            "affiliateId": 812,
            "affiliateName": "Tipster BR",
            "campaignName": "Brasileirão",
            "date": "2024-05-02",
            "lucro_tipster": "1000.50",
            "cpa": 1,
            "rvs": "1",
            "registrations": "4",
            "first_deposits": 3,
            "qualified_cpa": null
        }))
        .unwrap();

        assert_eq!(row.affiliate_id, "812");
        assert_eq!(row.lucro_tipster, Decimal::new(100050, 2));
        assert_eq!(row.rvs, Decimal::ONE);
        assert_eq!(row.registrations, 4);
        assert_eq!(row.first_deposits, 3);
        assert_eq!(row.qualified_cpa, 0);
        assert_eq!(row.campaign(), Some("Brasileirão"));
    }

    #[test]
    fn test_result_row_missing_counters_default_to_zero() {
        let row: ResultRow = serde_json::from_value(json!({
            "affiliateId": "77",
            "date": "2024-05-02",
            "campaignName": "   "
        }))
        .unwrap();
        assert_eq!(row.first_deposits, 0);
        assert_eq!(row.lucro_tipster, Decimal::ZERO);
        assert_eq!(row.campaign(), None);
    }

    #[test]
    fn test_result_row_rejects_garbage_number() {
        let result: Result<ResultRow, _> = serde_json::from_value(json!({
            "affiliateId": "77",
            "date": "2024-05-02",
            "first_deposits": "many"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_partner_affiliate_site_ids() {
        let affiliate: PartnerAffiliate = serde_json::from_value(json!({
            "id": 12,
            "name": "Casa",
            "siteIds": [1, "2", "x"]
        }))
        .unwrap();
        assert_eq!(affiliate.id, "12");
        assert_eq!(affiliate.site_ids, vec![1, 2]);
    }

    #[test]
    fn test_partner_affiliate_display_name_fallback() {
        let affiliate = PartnerAffiliate {
            id: "9".into(),
            name: Some(" ".into()),
            site_ids: vec![],
        };
        assert_eq!(affiliate.display_name(), "Affiliate 9");
    }

    #[test]
    fn test_placeholder_email() {
        assert_eq!(
            PartnerKind::Otg.placeholder_email("812"),
            "affiliate_812@otg.local"
        );
    }

    #[test]
    fn test_results_query_rejects_bad_dates() {
        assert!(ResultsQuery::from_date_strings("2024-5-1", "2024-05-31", 50).is_err());
        assert!(ResultsQuery::from_date_strings("2024-06-01", "2024-05-31", 50).is_err());
        assert!(ResultsQuery::from_date_strings("2024-05-01", "2024-05-31", 0).is_err());
    }

    #[test]
    fn test_results_query_pairs() {
        let mut query = ResultsQuery::from_date_strings("2024-05-01", "2024-05-31", 50)
            .unwrap()
            .with_page(2);
        query.affiliate_ids = vec!["1".into(), "2".into()];
        query.group_by = Some("day".into());

        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("startDate".into(), "2024-05-01".into())));
        assert!(pairs.contains(&("page".into(), "2".into())));
        assert!(pairs.contains(&("groupBy".into(), "day".into())));
        assert_eq!(
            pairs.iter().filter(|(k, _)| k == "affiliateIds[]").count(),
            2
        );
    }

    #[test]
    fn test_has_more_after() {
        let page = ResultsPage {
            rows: vec![],
            meta: Some(PartnerPageMeta {
                current_page: 1,
                total_pages: 3,
                total_rows: 120,
                page_size: 50,
            }),
        };
        assert!(page.has_more_after(1));
        assert!(page.has_more_after(2));
        assert!(!page.has_more_after(3));
        assert!(!ResultsPage::default().has_more_after(1));
    }

    #[test]
    fn test_registration_status_lenient() {
        let status: RegistrationStatus = serde_json::from_value(json!({
            "requestId": 5521,
            "status": "APPROVED",
            "affiliateLink": "https://sb.link/abc",
            "affiliateId": 99
        }))
        .unwrap();
        assert_eq!(status.request_id, "5521");
        assert_eq!(status.status, RegistrationState::Approved);
        assert_eq!(status.affiliate_id.as_deref(), Some("99"));
    }

    #[test]
    fn test_webhook_payload_state() {
        let payload: SuperbetWebhookPayload = serde_json::from_value(json!({
            "requestId": "r-1",
            "affiliateId": 10,
            "affiliateLink": "https://sb.link/x",
            "status": "rejected"
        }))
        .unwrap();
        assert_eq!(payload.state(), RegistrationState::Rejected);
        assert_eq!(payload.affiliate_id.as_deref(), Some("10"));
        assert_eq!(SuperbetWebhookPayload::default().state(), RegistrationState::Pending);
    }
}
