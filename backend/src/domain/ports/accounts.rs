//! Driving port for the account lifecycle.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{
    AccountUpdateForm, Error, LeaderboardEntry, Money, PurchaseSummary, RoleSet, SignupForm, User,
    Username,
};

/// Account page data: the user, their roles and aggregated purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    /// Account record.
    pub user: User,
    /// Roles held.
    pub roles: RoleSet,
    /// Purchases per product.
    pub purchases: Vec<PurchaseSummary>,
}

/// Use-case port orchestrating signup, edits, deletion and earnings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Validate the form, create the account and grant the `user` role.
    /// All violations are reported together.
    async fn signup(&self, form: SignupForm) -> Result<User, Error>;

    /// Apply optional email and password changes.
    async fn update_account(&self, username: &Username, form: AccountUpdateForm)
    -> Result<(), Error>;

    /// Remove the account, its roles, cart lines and purchase history.
    async fn delete_account(&self, username: &Username) -> Result<(), Error>;

    /// Account page data.
    async fn account_details(&self, username: &Username) -> Result<AccountDetails, Error>;

    /// Richest accounts first; `limit` defaults to 10.
    async fn leaderboard(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>, Error>;

    /// Credit `clicks` times the multiplier in whole currency units and
    /// return the new balance.
    async fn earn(&self, username: &Username, clicks: u32) -> Result<Money, Error>;
}
