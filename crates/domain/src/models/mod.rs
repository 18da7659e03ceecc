//! Domain models for the affiliate back office.

pub mod affiliate;
pub mod dashboard;
pub mod deal;
pub mod invite;
pub mod ledger;
pub mod link_event;
pub mod partner;
pub mod system_config;
pub mod user;

pub use affiliate::{Affiliate, AffiliateStatus};
pub use deal::{Deal, NewDeal};
pub use invite::{AffiliateInvite, InviteStatus};
pub use ledger::{TransactionStatus, TransactionType};
pub use link_event::{LinkEvent, LinkEventType};
pub use partner::{PartnerAffiliate, PartnerError, PartnerKind, ResultRow, ResultsPage, ResultsQuery};
pub use system_config::ConfigKey;
pub use user::{Role, User};
