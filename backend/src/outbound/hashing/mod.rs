//! Bcrypt-backed [`PasswordHasher`] adapter.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool.
//! Hashes use the standard `$2b$` encoding, so existing bcrypt hashes from
//! other systems verify unchanged.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHasher, PasswordHasherError};

/// Work factor used for new hashes.
pub const DEFAULT_COST: u32 = 12;

const DUMMY_PASSWORD: &str = "storefront-dummy-password";

/// Adaptive password hasher using bcrypt.
#[derive(Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
    dummy: Arc<OnceLock<String>>,
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl BcryptPasswordHasher {
    /// Hasher at [`DEFAULT_COST`].
    pub fn new() -> Self {
        Self::with_cost(DEFAULT_COST)
    }

    /// Hasher at a custom cost. Bcrypt accepts 4 to 31.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost,
            dummy: Arc::new(OnceLock::new()),
        }
    }
}

fn hashing_error(error: impl std::fmt::Display) -> PasswordHasherError {
    PasswordHasherError::hashing(error.to_string())
}

/// Hash of a fixed password at `cost`, computed once per hasher.
fn dummy_hash(slot: &OnceLock<String>, cost: u32) -> Result<String, PasswordHasherError> {
    if let Some(hash) = slot.get() {
        return Ok(hash.clone());
    }
    let hash = bcrypt::hash(DUMMY_PASSWORD, cost).map_err(hashing_error)?;
    Ok(slot.get_or_init(|| hash).clone())
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        let password = Zeroizing::new(password.to_owned());
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
            .await
            .map_err(hashing_error)?
            .map(PasswordHash::new)
            .map_err(hashing_error)
    }

    async fn verify(
        &self,
        password: &str,
        stored: Option<&PasswordHash>,
    ) -> Result<bool, PasswordHasherError> {
        let password = Zeroizing::new(password.to_owned());
        let stored = stored.map(|hash| hash.as_str().to_owned());
        let dummy = Arc::clone(&self.dummy);
        let cost = self.cost;
        tokio::task::spawn_blocking(move || match stored {
            Some(hash) => bcrypt::verify(password.as_bytes(), &hash).map_err(hashing_error),
            None => {
                // Burn the same work as a real comparison, then refuse.
                let hash = dummy_hash(&dummy, cost)?;
                bcrypt::verify(password.as_bytes(), &hash).map_err(hashing_error)?;
                Ok(false)
            }
        })
        .await
        .map_err(hashing_error)?
    }
}
