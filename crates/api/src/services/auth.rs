//! Password login and account maintenance.

use std::sync::Arc;

use domain::models::user::{
    ChangeCredentialsRequest, LoginRequest, LoginResponse, RegisterUserRequest, Role, User,
};
use persistence::entities::UserRoleDb;
use persistence::repositories::UserRepository;
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::JwtAuthConfig;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Provide a new email or a new password")]
    NothingToChange,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::NothingToChange => ApiError::Validation(err.to_string()),
            AuthError::Token(e) => ApiError::Internal(e.to_string()),
            AuthError::Password(e) => ApiError::Internal(e.to_string()),
            AuthError::Database(e) => e.into(),
        }
    }
}

/// Converts escaped `\n` sequences from env files into real newlines.
pub fn normalize_pem_key(key: &str) -> String {
    key.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .replace("\\n", "\n")
}

/// Builds the RS256 signer/verifier from configuration.
pub fn build_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, JwtError> {
    JwtConfig::with_leeway(
        &normalize_pem_key(&config.private_key),
        &normalize_pem_key(&config.public_key),
        config.token_expiry_secs,
        config.leeway_secs,
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let user: User = self
            .users
            .find_by_email(request.email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        let valid = match verify_password(&request.password, &user.password_hash) {
            Ok(valid) => valid,
            Err(PasswordError::InvalidHashFormat) => {
                warn!(user_id = %user.id, "Stored password hash is unreadable");
                false
            }
            Err(e) => return Err(e.into()),
        };
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let (token, _jti) = self.jwt.generate_token(user.id, user.role.as_str())?;
        Ok(token)
    }

    /// Creates a user. Affiliates created this way have no affiliate record yet.
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<User, AuthError> {
        let email = request.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;
        let role = request.role.unwrap_or(Role::Affiliate);
        let user = self
            .users
            .create_user(&email, &password_hash, request.name.trim(), UserRoleDb::from(role))
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::EmailAlreadyExists
                } else {
                    e.into()
                }
            })?;

        info!(user_id = %user.id, role = %role, "User registered");
        Ok(user.into())
    }

    pub async fn reset_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        let password_hash = hash_password(new_password)?;
        if !self.users.update_password(user_id, &password_hash).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(user_id = %user_id, "Password reset by admin");
        Ok(())
    }

    /// Changes the caller's email and/or password after re-checking the current one.
    pub async fn change_credentials(
        &self,
        user: &User,
        request: &ChangeCredentialsRequest,
    ) -> Result<User, AuthError> {
        if request.is_empty() {
            return Err(AuthError::NothingToChange);
        }
        if !verify_password(&request.current_password, &user.password_hash).unwrap_or(false) {
            return Err(AuthError::InvalidCredentials);
        }

        let new_email = request
            .new_email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.eq_ignore_ascii_case(&user.email));
        if let Some(email) = &new_email {
            if self.users.find_by_email(email).await?.is_some() {
                return Err(AuthError::EmailAlreadyExists);
            }
        }

        let new_hash = request
            .new_password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let updated = self
            .users
            .update_credentials(user.id, new_email.as_deref(), new_hash.as_deref())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::EmailAlreadyExists
                } else {
                    e.into()
                }
            })?
            .ok_or(AuthError::UserNotFound)?;

        info!(
            user_id = %user.id,
            email_changed = new_email.is_some(),
            password_changed = new_hash.is_some(),
            "Credentials changed"
        );
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pem_key() {
        let raw = "\"-----BEGIN PUBLIC KEY-----\\nABC\\n-----END PUBLIC KEY-----\"";
        assert_eq!(
            normalize_pem_key(raw),
            "-----BEGIN PUBLIC KEY-----\nABC\n-----END PUBLIC KEY-----"
        );
        let already = "-----BEGIN PUBLIC KEY-----\nABC\n-----END PUBLIC KEY-----";
        assert_eq!(normalize_pem_key(already), already);
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::EmailAlreadyExists),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::NothingToChange),
            ApiError::Validation(_)
        ));
    }
}
