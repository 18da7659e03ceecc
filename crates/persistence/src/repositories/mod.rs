//! Repository implementations for database operations.

pub mod affiliate;
pub mod dashboard;
pub mod deal;
pub mod invite;
pub mod link_event;
pub mod system_config;
pub mod user;

pub use affiliate::{AffiliateRepository, NewAccount, NewAffiliate};
pub use dashboard::{DashboardRepository, TransactionFilter};
pub use deal::DealRepository;
pub use invite::{InviteRepository, NewInvite};
pub use link_event::{LinkEventFilter, LinkEventRepository, NewLinkEvent};
pub use system_config::SystemConfigRepository;
pub use user::UserRepository;
