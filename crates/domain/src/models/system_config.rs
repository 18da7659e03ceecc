//! System-wide commission defaults stored in the `system_config` table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Known configuration keys and their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    CpaValue,
    RevenueSharePercentage,
    AdminSuperbetLink,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::CpaValue,
        ConfigKey::RevenueSharePercentage,
        ConfigKey::AdminSuperbetLink,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ConfigKey::CpaValue => "CPA_VALUE",
            ConfigKey::RevenueSharePercentage => "REVENUE_SHARE_PERCENTAGE",
            ConfigKey::AdminSuperbetLink => "ADMIN_SUPERBET_LINK",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::CpaValue => "300",
            ConfigKey::RevenueSharePercentage => "25",
            ConfigKey::AdminSuperbetLink => "",
        }
    }
}

/// Parses a stored numeric value, falling back to the key's default.
///
/// Returns the parsed value and whether the fallback was used.
pub fn parse_decimal_setting(key: ConfigKey, raw: &str) -> (Decimal, bool) {
    match raw.trim().parse::<Decimal>() {
        Ok(value) => (value, false),
        Err(_) => (
            key.default_value().parse().unwrap_or(Decimal::ZERO),
            true,
        ),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionConfigResponse {
    pub cpa_value: Decimal,
    pub rev_share_percentage: Decimal,
    pub admin_superbet_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommissionConfigRequest {
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub cpa_value: Option<Decimal>,
    #[validate(custom(function = "shared::validation::validate_percentage"))]
    pub rev_share_percentage: Option<Decimal>,
    #[validate(url(message = "Invalid link"))]
    pub admin_superbet_link: Option<String>,
}
