//! Commission defaults and the admin's Superbet link.

use domain::models::system_config::{
    CommissionConfigResponse, ConfigKey, UpdateCommissionConfigRequest,
};
use persistence::repositories::SystemConfigRepository;
use sqlx::PgPool;
use tracing::info;

#[derive(Clone)]
pub struct SystemConfigService {
    repo: SystemConfigRepository,
}

impl SystemConfigService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: SystemConfigRepository::new(pool),
        }
    }

    /// Stored value of `key`. A missing key is created with `default`.
    pub async fn get_or_default(&self, key: &str, default: &str) -> Result<String, sqlx::Error> {
        self.repo.get_or_insert(key, default).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        self.repo.set(key, value).await
    }

    /// Admin link used for invites; `None` when not configured.
    pub async fn admin_superbet_link(&self) -> Result<Option<String>, sqlx::Error> {
        let key = ConfigKey::AdminSuperbetLink;
        let link = self.get_or_default(key.key(), key.default_value()).await?;
        Ok(Some(link.trim().to_string()).filter(|l| !l.is_empty()))
    }

    pub async fn commission_config(&self) -> Result<CommissionConfigResponse, sqlx::Error> {
        let terms = self.repo.default_terms().await?;
        Ok(CommissionConfigResponse {
            cpa_value: terms.cpa_value,
            rev_share_percentage: terms.rev_share_percentage,
            admin_superbet_link: self.admin_superbet_link().await?,
        })
    }

    /// Applies the fields present in `update` and returns the new state.
    pub async fn update(
        &self,
        update: &UpdateCommissionConfigRequest,
    ) -> Result<CommissionConfigResponse, sqlx::Error> {
        if let Some(cpa) = update.cpa_value {
            self.set(ConfigKey::CpaValue.key(), &cpa.to_string()).await?;
        }
        if let Some(percentage) = update.rev_share_percentage {
            self.set(ConfigKey::RevenueSharePercentage.key(), &percentage.to_string())
                .await?;
        }
        if let Some(link) = &update.admin_superbet_link {
            self.set(ConfigKey::AdminSuperbetLink.key(), link.trim()).await?;
        }
        info!(
            cpa_value = ?update.cpa_value,
            rev_share_percentage = ?update.rev_share_percentage,
            admin_link_changed = update.admin_superbet_link.is_some(),
            "System configuration updated"
        );
        self.commission_config().await
    }
}
