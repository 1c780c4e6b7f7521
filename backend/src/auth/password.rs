//! Salted adaptive password hashing (bcrypt).
//!
//! bcrypt is CPU-bound, so both operations run on the blocking pool.

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| AppError::Internal(err.to_string()))?
            .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
    }

    /// Compares `password` with a stored hash. A malformed hash is treated as
    /// a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|err| AppError::Internal(err.to_string()))?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(err) => {
                tracing::warn!(error = %err, "Stored password hash could not be parsed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_original_password() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("admin123").await.unwrap();
        assert_ne!(hash, "admin123");
        assert!(hasher.verify("admin123", &hash).await.unwrap());
        assert!(!hasher.verify("admin124", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("admin123", "").await.unwrap());
        assert!(!hasher.verify("admin123", "not-a-bcrypt-hash").await.unwrap());
    }
}
