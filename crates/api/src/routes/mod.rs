//! HTTP route handlers.

pub mod affiliates;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod deals;
pub mod health;
pub mod invites;
pub mod referral;
pub mod sync;
pub mod tracking;
pub mod webhooks;
