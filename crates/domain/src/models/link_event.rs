//! Link tracking events posted by affiliate landing pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::dashboard::DateBounds;

/// Listing cap for the admin event view.
pub const LINK_EVENTS_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkEventType {
    #[default]
    Click,
    View,
    Conversion,
}

impl LinkEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkEventType::Click => "CLICK",
            LinkEventType::View => "VIEW",
            LinkEventType::Conversion => "CONVERSION",
        }
    }
}

impl FromStr for LinkEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CLICK" => Ok(LinkEventType::Click),
            "VIEW" => Ok(LinkEventType::View),
            "CONVERSION" => Ok(LinkEventType::Conversion),
            _ => Err(format!("Invalid link event type: {}", s)),
        }
    }
}

impl fmt::Display for LinkEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEvent {
    pub id: Uuid,
    pub affiliate_id: Option<Uuid>,
    /// Free-form channel tag such as `instagram` or `superbet`.
    pub link_type: String,
    pub link_url: String,
    pub event_type: LinkEventType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEventAffiliate {
    pub id: Uuid,
    pub name: String,
}

/// Event plus the owning affiliate's name, for the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEventView {
    #[serde(flatten)]
    pub event: LinkEvent,
    pub affiliate: Option<LinkEventAffiliate>,
}

/// Public tracking beacon body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackLinkEventRequest {
    pub affiliate_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "linkType is required"))]
    pub link_type: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 2048, message = "linkUrl is required"))]
    pub link_url: String,
    #[serde(default)]
    pub event_type: LinkEventType,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackLinkEventResponse {
    pub success: bool,
    pub event_id: Uuid,
}

/// Filters shared by the listing and the stats endpoint. The stats
/// endpoint ignores `event_type`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkEventQuery {
    #[serde(alias = "affiliate_id")]
    pub affiliate_id: Option<Uuid>,
    #[serde(alias = "link_type")]
    pub link_type: Option<String>,
    #[serde(alias = "event_type")]
    pub event_type: Option<LinkEventType>,
    #[serde(alias = "start_date")]
    #[validate(custom(function = "shared::validation::validate_date"))]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    #[validate(custom(function = "shared::validation::validate_date"))]
    pub end_date: Option<String>,
}

impl LinkEventQuery {
    pub fn bounds(&self) -> Result<DateBounds, String> {
        DateBounds::from_days(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTypeCount {
    pub link_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEventStats {
    pub total_clicks: i64,
    pub total_views: i64,
    pub total_conversions: i64,
    pub clicks_by_type: Vec<LinkTypeCount>,
}
