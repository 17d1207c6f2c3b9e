//! Credential authentication service.
//!
//! One verification path serves both callers: the per-request Basic-auth
//! extractor and the explicit login operation. An unknown username and a
//! wrong password are reported as distinct errors on purpose; that is part
//! of the contract, not an oversight to harden.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::{check_password_length, User},
    repository::Repository,
};

/// Authenticated-identity token produced by successful verification. The
/// authority set is always empty: the only tiers are anonymous and
/// authenticated.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Identity {
    pub username: String,
    pub authorities: Vec<String>,
}

/// Hash a plaintext password with Argon2, enforcing the length policy first
pub fn hash_password(password: &str) -> AppResult<String> {
    check_password_length(password)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored Argon2 hash. The stored form
/// is irreversible; verification recomputes and compares.
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
}

impl AuthService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Validate the presented credentials and return the matching user
    async fn verify(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(format!("No user with username {}", username)))?;

        if !verify_password(user.password_hash(), password)? {
            return Err(AppError::BadCredentials);
        }

        Ok(user)
    }

    /// Authenticate and produce the identity token stamped onto the request
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Identity> {
        let user = self.verify(username, password).await?;
        Ok(Identity {
            username: user.username().to_string(),
            authorities: Vec::new(),
        })
    }

    /// Explicit login: same validation, but the caller gets the full user
    /// record back
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        self.verify(username, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "hunter22").unwrap());
        assert!(!verify_password(&hash, "hunter23").unwrap());
    }

    #[test]
    fn short_password_is_rejected_before_hashing() {
        let err = hash_password("abc").unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "password", .. }));
    }
}
