//! User identity records and their value types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Money;

/// Validation errors for user value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Username was blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username exceeded [`USERNAME_MAX`] characters.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Username contained whitespace or control characters.
    #[error("username must not contain whitespace")]
    UsernameInvalidCharacters,
    /// Multiplier was zero.
    #[error("multiplier must be at least 1")]
    ZeroMultiplier,
}

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 64;

/// Surrogate key of a stored user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a store-assigned identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique login name.
///
/// ## Invariants
/// - Trimmed, non-empty, at most [`USERNAME_MAX`] characters.
/// - Contains no whitespace or control characters.
///
/// Length rules for new signups live in the signup form, not here, so
/// existing accounts with shorter names can still sign in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a username.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Earnings multiplier applied to balance credits; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multiplier(u32);

impl Multiplier {
    /// Multiplier given to new accounts.
    pub const BASE: Self = Self(1);

    /// Validate and construct a multiplier.
    pub fn new(value: u32) -> Result<Self, UserValidationError> {
        if value == 0 {
            return Err(UserValidationError::ZeroMultiplier);
        }
        Ok(Self(value))
    }

    /// Raw multiplier value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Raise the multiplier by `bonus`, saturating at `u32::MAX`.
    #[must_use]
    pub fn raised_by(self, bonus: u32) -> Self {
        Self(self.0.saturating_add(bonus))
    }
}

/// Stored user account without credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Surrogate key.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Contact address supplied at signup.
    pub email: String,
    /// Spendable balance; never negative.
    pub balance: Money,
    /// Earnings multiplier.
    pub multiplier: Multiplier,
}

/// Row of the balance leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Account name.
    pub username: Username,
    /// Current balance.
    pub balance: Money,
}
