//! Persistence layer for the affiliate back office.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - `PgLedgerStore`, the sqlx implementation of the reconciliation store
//! - Query timing metrics

pub mod db;
pub mod entities;
pub mod ledger_store;
pub mod metrics;
pub mod repositories;

pub use ledger_store::PgLedgerStore;
