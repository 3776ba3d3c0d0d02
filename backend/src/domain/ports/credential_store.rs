//! Driving port for account credentials.
//!
//! Inbound adapters call this port to register accounts and check logins
//! without knowing how passwords are hashed or where accounts live.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, User, UserId, Username};

/// Use-case port owning user identity records and password verification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Hash the password and store a new account.
    ///
    /// Fails with a conflict when the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        email: &str,
        password: &str,
    ) -> Result<UserId, Error>;

    /// Whether the credentials match a stored account. Unknown usernames and
    /// wrong passwords both yield `Ok(false)`.
    async fn verify_credentials(&self, credentials: &LoginCredentials) -> Result<bool, Error>;

    /// Re-hash and store a new password; not found when the user is absent.
    async fn update_password(&self, username: &Username, password: &str) -> Result<(), Error>;

    /// Replace the email; not found when the user is absent.
    async fn update_email(&self, username: &Username, email: &str) -> Result<(), Error>;

    /// Remove the account record; not found when the user is absent.
    async fn delete_user(&self, username: &Username) -> Result<(), Error>;

    /// Look up an account.
    async fn find_user(&self, username: &Username) -> Result<Option<User>, Error>;
}
