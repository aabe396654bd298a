use tokio::task;
use tracing::{error, instrument};

use crate::shared::AppError;

/// Lowest work factor bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;

/// One-way password hashing with bcrypt.
/// Hashing is CPU-bound, so both operations run on the blocking pool.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    #[instrument(skip_all)]
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.cost;

        task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                AppError::Internal(e.to_string())
            })
    }

    /// Returns false for a wrong password; an unreadable stored hash is an error
    #[instrument(skip_all)]
    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();

        task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "Stored password hash is invalid");
                AppError::Internal(e.to_string())
            })
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
