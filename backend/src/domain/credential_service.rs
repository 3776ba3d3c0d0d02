//! Credential store service.
//!
//! Implements [`CredentialStore`] on top of a [`UserRepository`] and a
//! [`PasswordHasher`]. Plaintext passwords never leave this module except as
//! input to the hasher.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{
    CredentialStore, NewUser, PasswordHasher, PasswordHasherError, UserRepository,
    UserRepositoryError,
};
use crate::domain::{Error, LoginCredentials, User, UserId, Username};

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::UsernameTaken { username } => {
            Error::conflict(format!("username {username} is already taken"))
                .with_details(json!({ "field": "username", "code": "username_taken" }))
        }
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}

/// Credential store backed by a user repository and an adaptive hasher.
#[derive(Clone)]
pub struct CredentialService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> CredentialService<U, H> {
    /// Create a credential service.
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }
}

impl<U, H> CredentialService<U, H>
where
    U: UserRepository,
{
    async fn require_user(&self, username: &Username) -> Result<User, Error> {
        self.users
            .find_by_username(username)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {username} not found")))
    }
}

#[async_trait]
impl<U, H> CredentialStore for CredentialService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn create_user(
        &self,
        username: &Username,
        email: &str,
        password: &str,
    ) -> Result<UserId, Error> {
        let password_hash = self.hasher.hash(password).await.map_err(map_hasher_error)?;
        let user = self
            .users
            .insert(&NewUser {
                username: username.clone(),
                email: email.trim().to_owned(),
                password_hash,
            })
            .await
            .map_err(map_user_error)?;
        debug!(user_id = %user.id, %username, "account created");
        Ok(user.id)
    }

    async fn verify_credentials(&self, credentials: &LoginCredentials) -> Result<bool, Error> {
        let stored = self
            .users
            .find_credentials(credentials.username())
            .await
            .map_err(map_user_error)?;
        // Unknown users still pay for a comparison inside the hasher.
        let verified = self
            .hasher
            .verify(
                credentials.password(),
                stored.as_ref().map(|found| &found.password_hash),
            )
            .await
            .map_err(map_hasher_error)?;
        if !verified {
            debug!(username = %credentials.username(), "credentials rejected");
        }
        Ok(verified)
    }

    async fn update_password(&self, username: &Username, password: &str) -> Result<(), Error> {
        let user = self.require_user(username).await?;
        let password_hash = self.hasher.hash(password).await.map_err(map_hasher_error)?;
        let updated = self
            .users
            .update_password_hash(user.id, &password_hash)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {username} not found")));
        }
        Ok(())
    }

    async fn update_email(&self, username: &Username, email: &str) -> Result<(), Error> {
        let user = self.require_user(username).await?;
        let updated = self
            .users
            .update_email(user.id, email.trim())
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {username} not found")));
        }
        Ok(())
    }

    async fn delete_user(&self, username: &Username) -> Result<(), Error> {
        let user = self.require_user(username).await?;
        let deleted = self.users.delete(user.id).await.map_err(map_user_error)?;
        if !deleted {
            return Err(Error::not_found(format!("user {username} not found")));
        }
        debug!(user_id = %user.id, %username, "account deleted");
        Ok(())
    }

    async fn find_user(&self, username: &Username) -> Result<Option<User>, Error> {
        self.users
            .find_by_username(username)
            .await
            .map_err(map_user_error)
    }
}

#[cfg(test)]
#[path = "credential_service_tests.rs"]
mod tests;
