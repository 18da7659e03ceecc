//! Mirrors a partner's affiliate list into local users and affiliates.
//!
//! Sync is additive: unknown partner ids get a placeholder user and a new
//! affiliate, known ones have their name and site ids refreshed, and local
//! affiliates missing from the partner list are left alone.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::partner::{PartnerAffiliate, PartnerError};
use crate::services::ledger::{LedgerError, LedgerStore, NewPartnerAffiliate};
use crate::services::partner_feed::PartnerFeed;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateSyncSummary {
    pub configured: bool,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

enum Upserted {
    Created,
    Updated,
}

pub struct AffiliateSync {
    feed: Arc<dyn PartnerFeed>,
    store: Arc<dyn LedgerStore>,
}

impl AffiliateSync {
    pub fn new(feed: Arc<dyn PartnerFeed>, store: Arc<dyn LedgerStore>) -> Self {
        Self { feed, store }
    }

    /// Runs one full pass. Partner failures abort; per-affiliate store
    /// failures are logged and counted.
    pub async fn run(&self) -> Result<AffiliateSyncSummary, PartnerError> {
        let partner = self.feed.kind();
        if !self.feed.is_configured() {
            warn!(partner = %partner, "Partner API key not configured, skipping affiliate sync");
            return Ok(AffiliateSyncSummary::default());
        }

        let affiliates = self.feed.fetch_affiliates().await?;
        let mut summary = AffiliateSyncSummary {
            configured: true,
            fetched: affiliates.len(),
            ..Default::default()
        };

        for affiliate in &affiliates {
            match self.upsert(affiliate).await {
                Ok(Upserted::Created) => summary.created += 1,
                Ok(Upserted::Updated) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        partner = %partner,
                        external_id = %affiliate.id,
                        error = %e,
                        "Failed to sync partner affiliate"
                    );
                }
            }
        }

        counter!("affiliate_sync_created_total", "partner" => partner.as_str())
            .increment(summary.created as u64);
        counter!("affiliate_sync_updated_total", "partner" => partner.as_str())
            .increment(summary.updated as u64);

        info!(
            partner = %partner,
            fetched = summary.fetched,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            "Affiliate sync finished"
        );
        Ok(summary)
    }

    async fn upsert(&self, affiliate: &PartnerAffiliate) -> Result<Upserted, LedgerError> {
        let partner = self.feed.kind();
        let name = affiliate.display_name();

        if let Some(existing) = self
            .store
            .find_partner_affiliate(partner, &affiliate.id)
            .await?
        {
            self.store
                .refresh_partner_affiliate(existing.id, &name, &affiliate.site_ids)
                .await?;
            return Ok(Upserted::Updated);
        }

        let password_hash =
            shared::password::hash_password(&shared::crypto::generate_temp_password())
                .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let new = NewPartnerAffiliate {
            external_id: affiliate.id.clone(),
            name,
            site_ids: affiliate.site_ids.clone(),
            email: partner.placeholder_email(&affiliate.id),
            password_hash,
        };
        let id = self.store.create_partner_affiliate(partner, &new).await?;
        info!(partner = %partner, external_id = %affiliate.id, affiliate_id = %id, "Created affiliate from partner");
        Ok(Upserted::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::partner::PartnerKind;
    use crate::services::test_support::{partner_affiliate, MemoryLedger, ScriptedFeed};

    #[tokio::test]
    async fn test_creates_unknown_and_refreshes_known() {
        let store = Arc::new(MemoryLedger::default());
        let feed = Arc::new(ScriptedFeed::new(PartnerKind::Otg).with_affiliates(vec![
            partner_affiliate("812", "Tipster BR", &[1, 2]),
            partner_affiliate("900", "Casa Aposta", &[]),
        ]));
        let sync = AffiliateSync::new(feed.clone(), store.clone());

        let first = sync.run().await.unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.updated, 0);

        let linked = store.affiliate_by_external("812").unwrap();
        assert_eq!(linked.name, "Tipster BR");
        assert_eq!(
            store.user_email_for(linked.id).as_deref(),
            Some("affiliate_812@otg.local")
        );

        feed.set_affiliates(vec![partner_affiliate("812", "Tipster Brasil", &[3])]);
        let second = sync.run().await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 1);

        let refreshed = store.affiliate_by_external("812").unwrap();
        assert_eq!(refreshed.id, linked.id);
        assert_eq!(refreshed.name, "Tipster Brasil");
        assert_eq!(refreshed.site_ids, vec![3]);
        // Not pruned.
        assert!(store.affiliate_by_external("900").is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_feed_is_skipped() {
        let store = Arc::new(MemoryLedger::default());
        let feed = Arc::new(
            ScriptedFeed::new(PartnerKind::Otg)
                .with_affiliates(vec![partner_affiliate("1", "A", &[])])
                .unconfigured(),
        );

        let summary = AffiliateSync::new(feed, store.clone()).run().await.unwrap();
        assert!(!summary.configured);
        assert_eq!(store.affiliate_count(), 0);
    }

    #[tokio::test]
    async fn test_partner_failure_aborts() {
        let store = Arc::new(MemoryLedger::default());
        let feed = Arc::new(ScriptedFeed::new(PartnerKind::Otg).failing_with_unauthorized());

        let result = AffiliateSync::new(feed, store).run().await;
        assert!(matches!(result, Err(PartnerError::InvalidCredentials(_))));
    }
}
