//! Password hashing and credential token generation
//!
//! Passwords are stored as Argon2 PHC strings. Plaintext values only ever
//! travel inside [`Secret`] and are dropped once hashed or sent.

use argon2::{
    password_hash::{rand_core::OsRng as SaltRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use portal_common::Secret;
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

/// Random bytes in a temporary password (22 URL-safe characters)
pub const TEMPORARY_PASSWORD_BYTES: usize = 16;

/// Random bytes in a password reset token (43 URL-safe characters)
pub const RESET_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn random_token(bytes: usize) -> Secret {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    Secret::new(URL_SAFE_NO_PAD.encode(&buf))
}

/// Fresh temporary password for a provisioned account
pub fn temporary_password() -> Secret {
    random_token(TEMPORARY_PASSWORD_BYTES)
}

/// Fresh single-use password reset token
pub fn reset_token() -> Secret {
    random_token(RESET_TOKEN_BYTES)
}

pub fn hash_password(password: &Secret) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut SaltRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Hash on the blocking pool; Argon2 is deliberately slow
pub async fn hash_password_blocking(password: Secret) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// `false` for a wrong password and for an unparseable stored hash
pub fn verify_password(password: &Secret, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.expose().as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
            false
        },
    }
}

pub async fn verify_password_blocking(
    password: Secret,
    stored_hash: String,
) -> Result<bool, CredentialError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_shape() {
        let password = temporary_password();
        assert_eq!(password.len(), 22);
        assert!(password
            .expose()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(password, temporary_password());
    }

    #[test]
    fn test_reset_token_shape() {
        assert_eq!(reset_token().len(), 43);
    }

    #[test]
    fn test_hash_and_verify() {
        let password = Secret::new("correct horse battery staple");
        let hash = hash_password(&password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("correct horse"));
        assert!(verify_password(&password, &hash));
        assert!(!verify_password(&Secret::new("wrong"), &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password(&Secret::new("anything"), "plaintext"));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hash = hash_password_blocking(Secret::new("pw")).await.unwrap();
        assert!(verify_password_blocking(Secret::new("pw"), hash).await.unwrap());
    }
}
