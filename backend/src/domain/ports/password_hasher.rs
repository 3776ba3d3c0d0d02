//! Driven port for adaptive password hashing.

use async_trait::async_trait;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashers.
    pub enum PasswordHasherError {
        /// Hashing or verification could not run.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Port for hashing and verifying passwords.
///
/// Implementations use a slow adaptive hash and must perform a comparable
/// amount of work when `stored` is `None`, so callers cannot tell unknown
/// accounts apart from wrong passwords by timing.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password.
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError>;

    /// Check `password` against `stored`; `Ok(false)` when `stored` is absent.
    async fn verify(
        &self,
        password: &str,
        stored: Option<&PasswordHash>,
    ) -> Result<bool, PasswordHasherError>;
}
