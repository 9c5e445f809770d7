//! Argon2id implementation of the `PasswordHasher` port.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::password_hash::{Error as PhcError, PasswordHash as PhcHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use async_trait::async_trait;
use rand::rngs::OsRng;

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{PasswordHash, PlainPassword};

/// Argon2id (v19) hasher with the crate's default cost parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

fn hash_blocking(password: &PlainPassword) -> Result<PasswordHash, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| PasswordHash::new(hash.to_string()))
        .map_err(|err| PasswordHashError::hashing(err.to_string()))
}

fn verify_blocking(password: &PlainPassword, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
    let parsed =
        PhcHash::new(hash.as_ref()).map_err(|err| PasswordHashError::malformed_hash(err.to_string()))?;
    match Argon2::default().verify_password(password.expose().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(err) => Err(PasswordHashError::hashing(err.to_string())),
    }
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, PasswordHashError> {
        let password = password.clone();
        tokio::task::spawn_blocking(move || hash_blocking(&password))
            .await
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?
    }

    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashError> {
        let password = password.clone();
        let hash = hash.clone();
        tokio::task::spawn_blocking(move || verify_blocking(&password, &hash))
            .await
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    //! Hash and verify behaviour against real Argon2 output.
    use super::*;
    use rstest::rstest;

    fn password(raw: &str) -> PlainPassword {
        PlainPassword::for_login(raw).expect("valid password")
    }

    #[rstest]
    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash(&password("correct horse")).await.expect("hash");

        assert!(hash.as_ref().starts_with("$argon2id$"));
        assert!(hasher.verify(&password("correct horse"), &hash).await.expect("verify"));
        assert!(!hasher.verify(&password("wrong horse"), &hash).await.expect("verify"));
    }

    #[rstest]
    #[tokio::test]
    async fn salts_differ_between_hashes() {
        let hasher = Argon2PasswordHasher::new();
        let first = hasher.hash(&password("same secret")).await.expect("hash");
        let second = hasher.hash(&password("same secret")).await.expect("hash");
        assert_ne!(first, second);
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_hashes_are_reported() {
        let hasher = Argon2PasswordHasher::new();
        let err = hasher
            .verify(&password("anything"), &PasswordHash::new("not-a-phc-string"))
            .await
            .expect_err("malformed");
        assert!(matches!(err, PasswordHashError::MalformedHash { .. }));
    }
}
