//! Partner sync runs shared by the scheduled jobs and the admin endpoints.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use domain::models::partner::{PartnerError, PartnerKind};
use domain::services::{
    AffiliateSync, AffiliateSyncSummary, ReconciliationEngine, ReconciliationSettings,
    SyncSummary,
};
use persistence::PgLedgerStore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::metrics::record_job_duration;
use crate::partners::Partners;

/// Per-partner locks, one for affiliate syncs and one for results syncs.
/// Each is held for the whole run so a scheduled job and an on-demand request
/// of the same kind never overlap in this process.
#[derive(Default)]
pub struct SyncLocks {
    otg_affiliates: Mutex<()>,
    otg_results: Mutex<()>,
    superbet_affiliates: Mutex<()>,
    superbet_results: Mutex<()>,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_acquire_affiliates(&self, kind: PartnerKind) -> Option<MutexGuard<'_, ()>> {
        match kind {
            PartnerKind::Otg => self.otg_affiliates.try_lock().ok(),
            PartnerKind::Superbet => self.superbet_affiliates.try_lock().ok(),
        }
    }

    fn try_acquire_results(&self, kind: PartnerKind) -> Option<MutexGuard<'_, ()>> {
        match kind {
            PartnerKind::Otg => self.otg_results.try_lock().ok(),
            PartnerKind::Superbet => self.superbet_results.try_lock().ok(),
        }
    }
}

/// Explicit date range for a results sync; both ends or neither.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRangeQuery {
    #[serde(alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "end_date")]
    pub end_date: Option<NaiveDate>,
}

impl SyncRangeQuery {
    pub fn range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, ApiError> {
        match (self.start_date, self.end_date) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start <= end => Ok(Some((start, end))),
            (Some(_), Some(_)) => Err(ApiError::Validation(
                "startDate must not be after endDate".to_string(),
            )),
            _ => Err(ApiError::Validation(
                "startDate and endDate must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub partner: PartnerKind,
    pub success: bool,
    pub message: String,
    pub affiliates_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaigns_count: Option<usize>,
}

#[derive(Clone)]
pub struct SyncService {
    pool: PgPool,
    partners: Partners,
    locks: Arc<SyncLocks>,
    window_days: u32,
    otg_page_size: u32,
    superbet_page_size: u32,
    superbet_results_enabled: bool,
}

impl SyncService {
    pub fn new(pool: PgPool, partners: Partners, locks: Arc<SyncLocks>, config: &Config) -> Self {
        Self {
            pool,
            partners,
            locks,
            window_days: config.sync.results_window_days,
            otg_page_size: config.partners.otg.page_size,
            superbet_page_size: config.partners.superbet.page_size,
            superbet_results_enabled: config.partners.superbet.results_sync_enabled,
        }
    }

    fn settings(&self, kind: PartnerKind) -> ReconciliationSettings {
        let page_size = match kind {
            PartnerKind::Otg => self.otg_page_size,
            PartnerKind::Superbet => self.superbet_page_size,
        };
        ReconciliationSettings {
            window_days: self.window_days,
            page_size,
        }
    }

    fn busy(kind: PartnerKind, what: &str) -> ApiError {
        ApiError::Conflict(format!("A {} {} sync is already running", kind, what))
    }

    pub async fn run_affiliate_sync(
        &self,
        kind: PartnerKind,
    ) -> Result<AffiliateSyncSummary, ApiError> {
        let _guard = self
            .locks
            .try_acquire_affiliates(kind)
            .ok_or_else(|| Self::busy(kind, "affiliate"))?;
        let started = Instant::now();

        let store = Arc::new(PgLedgerStore::new(self.pool.clone()));
        let result = AffiliateSync::new(self.partners.feed(kind), store).run().await;
        record_job_duration(
            "affiliate_sync",
            outcome(&result),
            started.elapsed().as_secs_f64(),
        );

        let summary = result?;
        info!(
            partner = %kind,
            fetched = summary.fetched,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            "Affiliate sync finished"
        );
        Ok(summary)
    }

    /// Reconciles `range`, or the rolling window when `None`.
    pub async fn run_results_sync(
        &self,
        kind: PartnerKind,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<SyncSummary, ApiError> {
        if kind == PartnerKind::Superbet && !self.superbet_results_enabled {
            info!("Superbet results sync disabled, skipping");
            return Ok(SyncSummary::default());
        }

        let _guard = self
            .locks
            .try_acquire_results(kind)
            .ok_or_else(|| Self::busy(kind, "results"))?;
        let started = Instant::now();

        let store = Arc::new(PgLedgerStore::new(self.pool.clone()));
        let engine = ReconciliationEngine::new(self.partners.feed(kind), store, self.settings(kind));
        let result = match range {
            Some((start, end)) => engine.sync_range(start, end).await,
            None => engine.sync_recent().await,
        };
        record_job_duration(
            "results_sync",
            outcome(&result),
            started.elapsed().as_secs_f64(),
        );

        Ok(result?)
    }

    /// Lists affiliates (and OTG campaigns) to prove the credentials work.
    pub async fn test_connection(&self, kind: PartnerKind) -> ConnectionReport {
        let feed = self.partners.feed(kind);
        if !feed.is_configured() {
            return ConnectionReport {
                partner: kind,
                success: false,
                message: PartnerError::NotConfigured(kind).to_string(),
                affiliates_count: None,
                campaigns_count: None,
            };
        }

        let affiliates = feed.fetch_affiliates().await;
        let campaigns = match (kind, self.partners.otg_client()) {
            (PartnerKind::Otg, Some(client)) => Some(client.fetch_campaigns().await.map(|c| c.len())),
            _ => None,
        };

        match (affiliates, campaigns.transpose()) {
            (Ok(affiliates), Ok(campaigns_count)) => ConnectionReport {
                partner: kind,
                success: true,
                message: format!("Connection to {} established", kind),
                affiliates_count: Some(affiliates.len()),
                campaigns_count,
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(partner = %kind, error = %e, "Partner connection test failed");
                ConnectionReport {
                    partner: kind,
                    success: false,
                    message: e.to_string(),
                    affiliates_count: None,
                    campaigns_count: None,
                }
            }
        }
    }
}

fn outcome<T>(result: &Result<T, PartnerError>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "failure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_range_requires_both_ends() {
        let query = SyncRangeQuery {
            start_date: Some(date("2024-01-01")),
            end_date: None,
        };
        assert!(matches!(query.range(), Err(ApiError::Validation(_))));
        assert!(SyncRangeQuery::default().range().unwrap().is_none());
    }

    #[test]
    fn test_range_rejects_inverted_dates() {
        let query = SyncRangeQuery {
            start_date: Some(date("2024-02-01")),
            end_date: Some(date("2024-01-01")),
        };
        assert!(query.range().is_err());

        let query = SyncRangeQuery {
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2024-01-31")),
        };
        assert_eq!(
            query.range().unwrap(),
            Some((date("2024-01-01"), date("2024-01-31")))
        );
    }

    #[test]
    fn test_locks_are_per_partner() {
        let locks = SyncLocks::new();
        let otg = locks.try_acquire_results(PartnerKind::Otg);
        assert!(otg.is_some());
        assert!(locks.try_acquire_results(PartnerKind::Otg).is_none());
        assert!(locks.try_acquire_results(PartnerKind::Superbet).is_some());
        drop(otg);
        assert!(locks.try_acquire_results(PartnerKind::Otg).is_some());
    }

    #[test]
    fn test_running_results_sync_does_not_block_affiliate_sync() {
        let locks = SyncLocks::new();
        let _results = locks.try_acquire_results(PartnerKind::Otg);

        let affiliates = locks.try_acquire_affiliates(PartnerKind::Otg);
        assert!(affiliates.is_some());
        assert!(locks.try_acquire_affiliates(PartnerKind::Otg).is_none());
        assert!(locks.try_acquire_results(PartnerKind::Otg).is_none());

        drop(affiliates);
        assert!(locks.try_acquire_affiliates(PartnerKind::Otg).is_some());
    }
}
