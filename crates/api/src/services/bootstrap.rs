//! Seeds the first admin account at startup.

use domain::models::Role;
use persistence::entities::UserRoleDb;
use persistence::repositories::UserRepository;
use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::BootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Creates the configured admin unless a user with that email exists.
pub async fn bootstrap_admin(pool: &PgPool, config: &BootstrapConfig) -> Result<(), BootstrapError> {
    if config.admin_email.is_empty() {
        return Ok(());
    }
    if config.admin_password.is_empty() {
        warn!("AFF__BOOTSTRAP__ADMIN_EMAIL is set but AFF__BOOTSTRAP__ADMIN_PASSWORD is empty, skipping bootstrap");
        return Ok(());
    }

    let users = UserRepository::new(pool.clone());
    if users.find_by_email(&config.admin_email).await?.is_some() {
        info!("Bootstrap admin already exists, skipping");
        return Ok(());
    }

    let password_hash = hash_password(&config.admin_password)?;
    let user = users
        .create_user(
            &config.admin_email.trim().to_lowercase(),
            &password_hash,
            "Administrator",
            UserRoleDb::from(Role::Admin),
        )
        .await?;

    info!(email = %user.email, user_id = %user.id, "Bootstrap admin created");
    warn!("Remove AFF__BOOTSTRAP__ADMIN_PASSWORD from the environment once the admin has logged in");
    Ok(())
}
