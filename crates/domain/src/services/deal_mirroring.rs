//! Builds local deals for newly approved affiliates.
//!
//! Superbet's deal endpoint is not versioned and has been seen both wrapped
//! (`{"deal": {...}}`) and flat. Whatever arrives is kept verbatim in the
//! deal description for auditing.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::models::deal::NewDeal;
use crate::services::deal_resolution::DefaultTerms;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MirrorError {
    #[error("partner deal is missing {0}")]
    MissingField(&'static str),

    #[error("partner deal has an out-of-range {0}")]
    OutOfRange(&'static str),
}

fn decimal_field(obj: &Value, key: &str) -> Option<Decimal> {
    match obj.get(key)? {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Turns a Superbet deal payload into a new active deal.
pub fn mirror_partner_deal(payload: &Value, affiliate_name: &str) -> Result<NewDeal, MirrorError> {
    let (terms, name) = match payload.get("deal").filter(|d| d.is_object()) {
        Some(deal) => (deal, text_field(deal, "name")),
        None => (
            payload,
            text_field(payload, "name").or_else(|| text_field(payload, "dealName")),
        ),
    };

    let cpa_value = decimal_field(terms, "cpaValue").ok_or(MirrorError::MissingField("cpaValue"))?;
    let rev_share_percentage = decimal_field(terms, "revSharePercentage")
        .ok_or(MirrorError::MissingField("revSharePercentage"))?;

    if cpa_value.is_sign_negative() && !cpa_value.is_zero() {
        return Err(MirrorError::OutOfRange("cpaValue"));
    }
    if rev_share_percentage < Decimal::ZERO || rev_share_percentage > Decimal::ONE_HUNDRED {
        return Err(MirrorError::OutOfRange("revSharePercentage"));
    }

    let summary = text_field(terms, "description")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Deal mirrored from the Superbet API for {}", affiliate_name));
    let raw = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());

    Ok(NewDeal {
        name: name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Deal {}", affiliate_name)),
        cpa_value,
        rev_share_percentage,
        active: true,
        description: Some(format!(
            "{}\n\nSuperbet API payload:\n```json\n{}\n```",
            summary, raw
        )),
    })
}

/// Personal deal built from the current system defaults.
pub fn default_deal(affiliate_name: &str, defaults: &DefaultTerms) -> NewDeal {
    NewDeal {
        name: format!("Deal {}", affiliate_name),
        cpa_value: defaults.cpa_value,
        rev_share_percentage: defaults.rev_share_percentage,
        active: true,
        description: Some(format!("Deal created automatically for {}", affiliate_name)),
    }
}
