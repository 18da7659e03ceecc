//! Domain services for the affiliate back office.
//!
//! Business rules that operate on domain models. Storage and partner HTTP
//! access sit behind the `LedgerStore` and `PartnerFeed` traits.

pub mod affiliate_sync;
pub mod commission;
pub mod deal_mirroring;
pub mod deal_resolution;
pub mod invite_lifecycle;
pub mod ledger;
pub mod partner_feed;
pub mod reconciliation;

#[cfg(test)]
pub(crate) mod test_support;

pub use affiliate_sync::{AffiliateSync, AffiliateSyncSummary};
pub use deal_resolution::{resolve_terms, DefaultTerms, EffectiveTerms, TermsSource};
pub use ledger::{LedgerError, LedgerStore};
pub use partner_feed::{PartnerFeed, PartnerOnboarding};
pub use reconciliation::{ReconciliationEngine, ReconciliationSettings, SyncSummary};
