//! Shared utilities for the affiliate back office.
//!
//! - Password hashing with Argon2id
//! - Bearer token issuance and verification
//! - Random codes, temporary passwords and token comparison
//! - Input validation and page-based pagination helpers

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
