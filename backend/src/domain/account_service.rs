//! Account lifecycle service.
//!
//! Composes the credential, role and checkout ports into the account
//! flows exposed over HTTP: signup, edit, delete, details, the balance
//! leaderboard and earning by clicks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::forms::{USERNAME_TAKEN, USERNAME_TOO_SHORT};
use crate::domain::ports::{
    AccountDetails, Accounts, CheckoutLedger, CredentialStore, RoleStore,
    UserRepository, UserRepositoryError,
};
use crate::domain::{
    AccountUpdateForm, Error, ErrorCode, FormRejection, LeaderboardEntry, Money, RoleName,
    SignupForm, User, Username,
};

/// Leaderboard size used when the caller does not ask for one.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;
/// Most clicks accepted in one earn request.
pub const MAX_CLICKS_PER_REQUEST: u32 = 100;

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::UsernameTaken { .. } => {
            FormRejection::new(vec![USERNAME_TAKEN.to_owned()]).into()
        }
    }
}

/// Account flows over the driving ports of the other components.
#[derive(Clone)]
pub struct AccountService<U> {
    credentials: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
    checkout: Arc<dyn CheckoutLedger>,
    users: Arc<U>,
}

impl<U> AccountService<U> {
    /// Create an account service.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        roles: Arc<dyn RoleStore>,
        checkout: Arc<dyn CheckoutLedger>,
        users: Arc<U>,
    ) -> Self {
        Self {
            credentials,
            roles,
            checkout,
            users,
        }
    }

    async fn require_user(&self, username: &Username) -> Result<User, Error> {
        self.credentials
            .find_user(username)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {username} not found")))
    }
}

#[async_trait]
impl<U> Accounts for AccountService<U>
where
    U: UserRepository,
{
    async fn signup(&self, form: SignupForm) -> Result<User, Error> {
        let mut messages = form.violations();
        let username = Username::new(&form.username);
        if let Err(err) = &username
            && !messages.iter().any(|message| message == USERNAME_TOO_SHORT)
        {
            messages.push(format!("- {err}"));
        }
        let username = match username {
            Ok(username) if messages.is_empty() => username,
            _ => return Err(FormRejection::new(messages).into()),
        };
        if self.credentials.find_user(&username).await?.is_some() {
            return Err(FormRejection::new(vec![USERNAME_TAKEN.to_owned()]).into());
        }

        let user_id = match self
            .credentials
            .create_user(&username, &form.email, &form.password)
            .await
        {
            Ok(id) => id,
            // Lost a race with a concurrent signup for the same name.
            Err(err) if err.code() == ErrorCode::Conflict => {
                return Err(FormRejection::new(vec![USERNAME_TAKEN.to_owned()]).into());
            }
            Err(err) => return Err(err),
        };
        self.roles.grant_role(user_id, &RoleName::user()).await?;
        info!(%user_id, %username, "signup completed");
        self.require_user(&username).await
    }

    async fn update_account(
        &self,
        username: &Username,
        form: AccountUpdateForm,
    ) -> Result<(), Error> {
        let changes = form.validate()?;
        self.require_user(username).await?;
        if let Some(email) = changes.email.as_deref() {
            self.credentials.update_email(username, email).await?;
        }
        if let Some(password) = changes.password.as_deref() {
            self.credentials.update_password(username, password).await?;
        }
        Ok(())
    }

    async fn delete_account(&self, username: &Username) -> Result<(), Error> {
        // The user delete drops roles, cart lines and purchases with it.
        let user = self.require_user(username).await?;
        self.credentials.delete_user(username).await?;
        info!(user_id = %user.id, %username, "account deleted");
        Ok(())
    }

    async fn account_details(&self, username: &Username) -> Result<AccountDetails, Error> {
        let user = self.require_user(username).await?;
        let roles = self.roles.list_roles(user.id).await?;
        let purchases = self.checkout.purchase_history(user.id).await?;
        Ok(AccountDetails {
            user,
            roles,
            purchases,
        })
    }

    async fn leaderboard(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>, Error> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        if !(1..=MAX_LEADERBOARD_LIMIT).contains(&limit) {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_LEADERBOARD_LIMIT}"
            )));
        }
        self.users
            .top_by_balance(limit)
            .await
            .map_err(map_user_error)
    }

    async fn earn(&self, username: &Username, clicks: u32) -> Result<Money, Error> {
        if !(1..=MAX_CLICKS_PER_REQUEST).contains(&clicks) {
            return Err(Error::invalid_request(format!(
                "clicks must be between 1 and {MAX_CLICKS_PER_REQUEST}"
            )));
        }
        let user = self.require_user(username).await?;
        let amount = clicks
            .checked_mul(user.multiplier.get())
            .and_then(|units| Money::from_units(i64::from(units)).ok())
            .ok_or_else(|| Error::invalid_request("earned amount is too large"))?;
        let balance = self
            .users
            .credit_balance(user.id, amount)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {username} not found")))?;
        info!(user_id = %user.id, %amount, %balance, "balance credited");
        Ok(balance)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
