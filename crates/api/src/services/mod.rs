//! Application services that coordinate repositories and partner clients.

pub mod auth;
pub mod bootstrap;
pub mod deal_assignment;
pub mod onboarding;
pub mod sync;
pub mod system_config;

pub use auth::AuthService;
pub use deal_assignment::DealAssignment;
pub use onboarding::OnboardingService;
pub use sync::{SyncLocks, SyncService};
pub use system_config::SystemConfigService;
