//! System configuration repository.
//!
//! Plain key/value rows. Reads of a missing key insert the default with
//! `ON CONFLICT DO NOTHING`, so concurrent first reads agree on one row.

use domain::models::system_config::{parse_decimal_setting, ConfigKey};
use domain::services::DefaultTerms;
use sqlx::PgPool;
use tracing::warn;

use crate::metrics::QueryTimer;

/// Repository for system configuration operations.
#[derive(Clone)]
pub struct SystemConfigRepository {
    pool: PgPool,
}

impl SystemConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("get_system_config");
        let result = sqlx::query_scalar::<_, String>("SELECT value FROM system_config WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Stored value, inserting `default` first when the key is missing.
    pub async fn get_or_insert(&self, key: &str, default: &str) -> Result<String, sqlx::Error> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let timer = QueryTimer::new("insert_system_config_default");
        sqlx::query(
            r#"
            INSERT INTO system_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(default)
        .execute(&self.pool)
        .await?;
        timer.record();

        Ok(self.get(key).await?.unwrap_or_else(|| default.to_string()))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_system_config");
        sqlx::query(
            r#"
            INSERT INTO system_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(())
    }

    /// Inserts every missing key with its default. Existing values are kept.
    pub async fn seed_defaults(&self) -> Result<(), sqlx::Error> {
        for key in ConfigKey::ALL {
            self.get_or_insert(key.key(), key.default_value()).await?;
        }
        Ok(())
    }

    /// A numeric setting; unparsable stored values fall back to the default.
    pub async fn decimal_setting(
        &self,
        key: ConfigKey,
    ) -> Result<rust_decimal::Decimal, sqlx::Error> {
        let raw = self.get_or_insert(key.key(), key.default_value()).await?;
        let (value, fell_back) = parse_decimal_setting(key, &raw);
        if fell_back {
            warn!(key = key.key(), value = %raw, "Unparsable system config value, using default");
        }
        Ok(value)
    }

    /// Current CPA and revenue-share defaults.
    pub async fn default_terms(&self) -> Result<DefaultTerms, sqlx::Error> {
        Ok(DefaultTerms {
            cpa_value: self.decimal_setting(ConfigKey::CpaValue).await?,
            rev_share_percentage: self
                .decimal_setting(ConfigKey::RevenueSharePercentage)
                .await?,
        })
    }
}
