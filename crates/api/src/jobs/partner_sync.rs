//! Scheduled partner syncs.

use domain::models::partner::PartnerKind;
use tracing::info;

use crate::error::ApiError;
use crate::services::SyncService;

use super::scheduler::{Job, JobFrequency};

const PARTNERS: [PartnerKind; 2] = [PartnerKind::Otg, PartnerKind::Superbet];

/// Mirrors partner affiliates into the registry once an hour.
pub struct AffiliateSyncJob {
    sync: SyncService,
}

impl AffiliateSyncJob {
    pub fn new(sync: SyncService) -> Self {
        Self { sync }
    }
}

#[async_trait::async_trait]
impl Job for AffiliateSyncJob {
    fn name(&self) -> &'static str {
        "affiliate_sync"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let mut failures = Vec::new();
        for kind in PARTNERS {
            match self.sync.run_affiliate_sync(kind).await {
                Ok(_) => {}
                Err(ApiError::Conflict(_)) => {
                    info!(partner = %kind, "Affiliate sync already running, skipping");
                }
                Err(e) => failures.push(format!("{}: {}", kind, e)),
            }
        }
        into_result(failures)
    }
}

/// Reconciles the rolling results window every five minutes.
pub struct ResultsSyncJob {
    sync: SyncService,
}

impl ResultsSyncJob {
    pub fn new(sync: SyncService) -> Self {
        Self { sync }
    }
}

#[async_trait::async_trait]
impl Job for ResultsSyncJob {
    fn name(&self) -> &'static str {
        "results_sync"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(5)
    }

    async fn execute(&self) -> Result<(), String> {
        let mut failures = Vec::new();
        for kind in PARTNERS {
            match self.sync.run_results_sync(kind, None).await {
                Ok(summary) if summary.configured => {
                    info!(
                        partner = %kind,
                        rows = summary.rows_processed,
                        ftds = summary.ftds_created,
                        commissions = summary.commissions_created,
                        "Scheduled results sync finished"
                    );
                }
                Ok(_) => {}
                Err(ApiError::Conflict(_)) => {
                    info!(partner = %kind, "Results sync already running, skipping");
                }
                Err(e) => failures.push(format!("{}: {}", kind, e)),
            }
        }
        into_result(failures)
    }
}

/// One partner failing does not stop the other; both errors are reported.
fn into_result(failures: Vec<String>) -> Result<(), String> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("; "))
    }
}
