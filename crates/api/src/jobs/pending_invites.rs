//! Expires stale invites and polls Superbet for pending registrations.

use std::time::Instant;

use sqlx::PgPool;

use crate::middleware::metrics::record_job_duration;
use crate::partners::Partners;
use crate::services::OnboardingService;

use super::scheduler::{Job, JobFrequency};

pub struct PendingInvitesJob {
    pool: PgPool,
    partners: Partners,
}

impl PendingInvitesJob {
    pub fn new(pool: PgPool, partners: Partners) -> Self {
        Self { pool, partners }
    }
}

#[async_trait::async_trait]
impl Job for PendingInvitesJob {
    fn name(&self) -> &'static str {
        "pending_invites"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(10)
    }

    async fn execute(&self) -> Result<(), String> {
        let started = Instant::now();
        let service = OnboardingService::new(self.pool.clone(), self.partners.onboarding.clone());
        let result = service.check_pending_invites().await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        record_job_duration("pending_invites", outcome, started.elapsed().as_secs_f64());

        result
            .map(|_| ())
            .map_err(|e| format!("Pending invite check failed: {}", e))
    }
}
