//! Background jobs.

mod partner_sync;
mod pending_invites;
mod pool_metrics;
mod scheduler;

pub use partner_sync::{AffiliateSyncJob, ResultsSyncJob};
pub use pending_invites::PendingInvitesJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
