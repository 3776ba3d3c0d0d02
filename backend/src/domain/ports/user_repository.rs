//! Driven port for user account persistence.

use async_trait::async_trait;

use crate::domain::{LeaderboardEntry, Money, PasswordHash, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The unique username constraint rejected an insert.
        UsernameTaken { username: String } => "username already taken: {username}",
    }
}

/// Insert payload for a new account; balance starts at zero and the
/// multiplier at one.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: Username,
    /// Contact email.
    pub email: String,
    /// Adaptive hash of the chosen password.
    pub password_hash: PasswordHash,
}

/// A user together with the stored password hash.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    /// Account record.
    pub user: User,
    /// Hash to verify login attempts against.
    pub password_hash: PasswordHash,
}

/// Port for reading and mutating user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up an account by username.
    async fn find_by_username(&self, username: &Username)
    -> Result<Option<User>, UserRepositoryError>;

    /// Look up an account and its password hash by username.
    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Insert a new account.
    ///
    /// Fails with [`UserRepositoryError::UsernameTaken`] when the username is
    /// already registered.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Replace the email; returns `false` when the user does not exist.
    async fn update_email(&self, id: UserId, email: &str) -> Result<bool, UserRepositoryError>;

    /// Replace the password hash; returns `false` when the user does not exist.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserRepositoryError>;

    /// Delete the account together with its role grants, cart lines and
    /// purchase history. Reserved stock is not restored. Returns `false`
    /// when the user does not exist.
    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError>;

    /// Accounts ordered by balance descending, then username.
    async fn top_by_balance(&self, limit: u32)
    -> Result<Vec<LeaderboardEntry>, UserRepositoryError>;

    /// Add `amount` to the balance, returning the new balance or `None` when
    /// the user does not exist.
    async fn credit_balance(
        &self,
        id: UserId,
        amount: Money,
    ) -> Result<Option<Money>, UserRepositoryError>;
}
