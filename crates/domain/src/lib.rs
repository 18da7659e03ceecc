//! Domain layer for the affiliate back office.
//!
//! This crate contains:
//! - Domain models (affiliates, deals, ledger rows, invites, partner feed rows)
//! - Commission rules and deal precedence
//! - The partner reconciliation engine and affiliate sync, written against
//!   the `PartnerFeed` and `LedgerStore` seams

pub mod models;
pub mod services;
