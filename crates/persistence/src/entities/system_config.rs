//! System configuration entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the system_config table.
#[derive(Debug, Clone, FromRow)]
pub struct SystemConfigEntity {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
