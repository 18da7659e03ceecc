//! Attaching deals to affiliates.
//!
//! `ensure_deal` runs after onboarding steps and must never fail the caller:
//! every error is logged at warn and swallowed.

use std::sync::Arc;

use domain::models::affiliate::Affiliate;
use domain::models::deal::{
    AffiliateCredentials, Deal, DealAssociationResponse, DealSummary, STANDARD_DEAL_NAME,
};
use domain::models::system_config::ConfigKey;
use domain::services::deal_mirroring::{default_deal, mirror_partner_deal};
use domain::services::PartnerOnboarding;
use persistence::repositories::{
    AffiliateRepository, DealRepository, SystemConfigRepository, UserRepository,
};
use shared::crypto::generate_alphanumeric;
use shared::password::hash_password;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// Length of passwords handed out on deal association.
const ASSOCIATION_PASSWORD_LEN: usize = 12;

#[derive(Clone)]
pub struct DealAssignment {
    affiliates: AffiliateRepository,
    deals: DealRepository,
    users: UserRepository,
    config: SystemConfigRepository,
    onboarding: Arc<dyn PartnerOnboarding>,
}

impl DealAssignment {
    pub fn new(pool: PgPool, onboarding: Arc<dyn PartnerOnboarding>) -> Self {
        Self {
            affiliates: AffiliateRepository::new(pool.clone()),
            deals: DealRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            config: SystemConfigRepository::new(pool),
            onboarding,
        }
    }

    /// Gives the affiliate a deal if it has none.
    pub async fn ensure_deal(&self, affiliate_id: Uuid) {
        if let Err(e) = self.try_ensure_deal(affiliate_id).await {
            warn!(
                affiliate_id = %affiliate_id,
                error = %e,
                "Automatic deal association failed"
            );
        }
    }

    async fn try_ensure_deal(&self, affiliate_id: Uuid) -> Result<(), ApiError> {
        let affiliate: Affiliate = self
            .affiliates
            .find_by_id(affiliate_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?
            .into();

        if affiliate.deal_id.is_some() {
            return Ok(());
        }

        let deal = match self.mirrored_deal(&affiliate).await {
            Some(deal) => deal,
            None => self.fallback_deal(&affiliate).await?,
        };

        self.affiliates.set_deal(affiliate.id, Some(deal.id)).await?;
        info!(
            affiliate_id = %affiliate.id,
            deal_id = %deal.id,
            deal = %deal.name,
            "Deal associated automatically"
        );
        Ok(())
    }

    /// Deal copied from Superbet, when the partner has one for this affiliate.
    async fn mirrored_deal(&self, affiliate: &Affiliate) -> Option<Deal> {
        let superbet_id = affiliate.superbet_affiliate_id.as_deref()?;

        let payload = match self.onboarding.get_affiliate_deal(superbet_id).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!(superbet_affiliate_id = superbet_id, error = %e, "Could not fetch Superbet deal");
                return None;
            }
        };

        let new_deal = match mirror_partner_deal(&payload, &affiliate.name) {
            Ok(deal) => deal,
            Err(e) => {
                warn!(superbet_affiliate_id = superbet_id, error = %e, "Superbet deal incomplete");
                return None;
            }
        };

        match self.deals.create(&new_deal).await {
            Ok(entity) => Some(entity.into()),
            Err(e) => {
                warn!(error = %e, "Failed to store mirrored Superbet deal");
                None
            }
        }
    }

    /// The shared standard deal, or a personal one built from the defaults.
    async fn fallback_deal(&self, affiliate: &Affiliate) -> Result<Deal, ApiError> {
        if let Some(standard) = self.deals.find_active_by_name(STANDARD_DEAL_NAME).await? {
            return Ok(standard.into());
        }
        let defaults = self.config.default_terms().await?;
        let created = self
            .deals
            .create(&default_deal(&affiliate.name, &defaults))
            .await?;
        Ok(created.into())
    }

    /// Associates a deal and issues the affiliate a fresh password.
    pub async fn associate(
        &self,
        deal_id: Uuid,
        affiliate_id: Uuid,
    ) -> Result<DealAssociationResponse, ApiError> {
        let deal: Deal = self
            .deals
            .find_by_id(deal_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Deal not found".to_string()))?
            .into();
        let existing = self
            .affiliates
            .find_with_email(affiliate_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?;

        let password = generate_alphanumeric(ASSOCIATION_PASSWORD_LEN);
        let password_hash = hash_password(&password)?;
        self.users
            .update_password(existing.affiliate.user_id, &password_hash)
            .await?;

        let affiliate: Affiliate = self
            .affiliates
            .set_deal(affiliate_id, Some(deal.id))
            .await?
            .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))?
            .into();

        let referral_link = match affiliate.superbet_affiliate_link.clone() {
            Some(link) if !link.is_empty() => Some(link),
            _ => self
                .config
                .get(ConfigKey::AdminSuperbetLink.key())
                .await?
                .filter(|link| !link.is_empty()),
        };

        info!(affiliate_id = %affiliate.id, deal_id = %deal.id, "Deal associated, password regenerated");

        Ok(DealAssociationResponse {
            affiliate_id: affiliate.id,
            deal: DealSummary::from(&deal),
            credentials: AffiliateCredentials {
                email: existing.email,
                password,
            },
            referral_link,
        })
    }

    /// Clears the affiliate's deal.
    pub async fn dissociate(&self, affiliate_id: Uuid) -> Result<Affiliate, ApiError> {
        self.affiliates
            .set_deal(affiliate_id, None)
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Affiliate not found".to_string()))
    }
}
