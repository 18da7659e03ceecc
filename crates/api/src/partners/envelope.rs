//! Response envelope normalisation for partner list endpoints.
//!
//! Partners return lists in one of three shapes:
//!
//! ```text
//! [ ...rows ]
//! { "data": [ ...rows ], "meta": { ... } }
//! { "data": { "data": [ ...rows ], "meta": { ... } } }
//! ```
//!
//! Anything else is logged and treated as an empty list.

use domain::models::partner::{PartnerKind, PartnerPageMeta};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Shape of a partner list response.
#[derive(Debug, Clone, PartialEq)]
pub enum PartnerEnvelope {
    Bare(Vec<Value>),
    Wrapped { data: Vec<Value>, meta: Option<Value> },
    Nested { data: Vec<Value>, meta: Option<Value> },
    Unrecognised(Value),
}

impl PartnerEnvelope {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(rows) => PartnerEnvelope::Bare(rows),
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(data)) => PartnerEnvelope::Wrapped {
                    data,
                    meta: obj.remove("meta"),
                },
                Some(Value::Object(mut inner)) => match inner.remove("data") {
                    Some(Value::Array(data)) => PartnerEnvelope::Nested {
                        data,
                        meta: inner.remove("meta"),
                    },
                    other => {
                        if let Some(v) = other {
                            inner.insert("data".into(), v);
                        }
                        obj.insert("data".into(), Value::Object(inner));
                        PartnerEnvelope::Unrecognised(Value::Object(obj))
                    }
                },
                other => {
                    if let Some(v) = other {
                        obj.insert("data".into(), v);
                    }
                    PartnerEnvelope::Unrecognised(Value::Object(obj))
                }
            },
            other => PartnerEnvelope::Unrecognised(other),
        }
    }
}

/// Rows and paging metadata after normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub rows: Vec<T>,
    pub meta: Option<PartnerPageMeta>,
}

/// Decodes a list response of any supported shape.
///
/// Rows that do not decode are dropped with a warning; the rest are kept.
pub fn normalize<T: DeserializeOwned>(
    partner: PartnerKind,
    endpoint: &str,
    value: Value,
) -> Normalized<T> {
    let (raw_rows, raw_meta) = match PartnerEnvelope::classify(value) {
        PartnerEnvelope::Bare(rows) => (rows, None),
        PartnerEnvelope::Wrapped { data, meta } | PartnerEnvelope::Nested { data, meta } => {
            (data, meta)
        }
        PartnerEnvelope::Unrecognised(value) => {
            warn!(
                partner = %partner,
                endpoint,
                kind = value_kind(&value),
                "Unrecognised partner response envelope, treating as empty"
            );
            (Vec::new(), None)
        }
    };

    let total = raw_rows.len();
    let rows: Vec<T> = raw_rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(partner = %partner, endpoint, error = %e, "Dropping undecodable partner row");
                None
            }
        })
        .collect();
    if rows.len() < total {
        metrics::counter!("partner_rows_dropped_total", "partner" => partner.as_str())
            .increment((total - rows.len()) as u64);
    }

    let meta = raw_meta
        .filter(|m| !m.is_null())
        .and_then(|m| match serde_json::from_value::<PartnerPageMeta>(m) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(partner = %partner, endpoint, error = %e, "Ignoring unreadable page metadata");
                None
            }
        });

    Normalized { rows, meta }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
