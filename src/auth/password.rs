// Password hashing and verification service
// Argon2 work runs on the blocking pool so it never stalls other requests

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tokio::task;

use crate::config::PasswordConfig;
use crate::error::ApiError;

/// Password hashing failures
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("password task failed: {0}")]
    Task(String),
}

impl From<PasswordError> for ApiError {
    fn from(error: PasswordError) -> Self {
        ApiError::InternalError(error.to_string())
    }
}

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
    /// Hash verified against when no user matches, so both login failures cost the same
    dummy_hash: String,
}

impl PasswordService {
    /// Create a PasswordService with the configured Argon2id cost
    pub fn new(config: PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let dummy_hash = hash_with(&params, "ledger-dummy-password")?;

        Ok(Self { params, dummy_hash })
    }

    /// Hash a password using Argon2id with a random salt
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let params = self.params.clone();
        let password = password.to_string();

        task::spawn_blocking(move || hash_with(&params, &password))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Verify a password against a stored PHC hash string
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Spend one verification on a throwaway hash; always reports a mismatch
    pub async fn verify_dummy(&self, password: &str) -> Result<bool, PasswordError> {
        self.verify(password, &self.dummy_hash).await?;
        Ok(false)
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so the tests stay fast
    fn test_service() -> PasswordService {
        PasswordService::new(PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_hash_is_not_plaintext_and_verifies() {
        let service = test_service();
        let hash = service.hash("correct horse").await.unwrap();

        assert_ne!(hash, "correct horse");
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("correct horse", &hash).await.unwrap());
        assert!(!service.verify("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let service = test_service();
        let first = service.hash("same-password").await.unwrap();
        let second = service.hash("same-password").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let service = test_service();
        let result = service.verify("anything", "not-a-phc-string").await;

        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[tokio::test]
    async fn test_dummy_verification_never_matches() {
        let service = test_service();
        assert!(!service.verify_dummy("ledger-dummy-password").await.unwrap());
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let result = PasswordService::new(PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });

        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
