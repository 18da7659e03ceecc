//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod affiliate;
pub mod dashboard;
pub mod deal;
pub mod invite;
pub mod ledger;
pub mod link_event;
pub mod system_config;
pub mod user;

pub use affiliate::{AffiliateEntity, AffiliateStatusDb, AffiliateWithEmailEntity, ReferralEntity};
pub use dashboard::{AffiliatePerformanceEntity, LedgerTotalsEntity};
pub use deal::{DealAffiliateEntity, DealEntity};
pub use invite::{AffiliateInviteEntity, InviteStatusDb};
pub use ledger::{
    LinkedAffiliateEntity, TransactionStatusDb, TransactionTypeDb, TransactionViewEntity,
};
pub use link_event::{
    LinkEventEntity, LinkEventTotalsEntity, LinkEventTypeDb, LinkEventViewEntity,
    LinkTypeCountEntity,
};
pub use system_config::SystemConfigEntity;
pub use user::{UserEntity, UserRoleDb};
