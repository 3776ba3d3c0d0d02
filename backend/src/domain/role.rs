//! Role names and role sets used by the access gate.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors for role names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleValidationError {
    /// Role name was blank.
    #[error("role name must not be empty")]
    Empty,
    /// Role name used characters outside `[a-z0-9_]` or was too long.
    #[error("role name must be 1-32 lowercase letters, digits or underscores")]
    Invalid,
}

const ROLE_NAME_MAX: usize = 32;

/// Name of a role such as `user` or `admin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// Role granted to every account at signup.
    pub const USER: &'static str = "user";
    /// Role allowed to manage the catalogue and role grants.
    pub const ADMIN: &'static str = "admin";

    /// Validate and construct a role name. Input is lowercased.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RoleValidationError> {
        let name = raw.as_ref().trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(RoleValidationError::Empty);
        }
        let valid = name.len() <= ROLE_NAME_MAX
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(RoleValidationError::Invalid);
        }
        Ok(Self(name))
    }

    /// The `user` role.
    #[must_use]
    pub fn user() -> Self {
        Self(Self::USER.to_owned())
    }

    /// The `admin` role.
    #[must_use]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_owned())
    }

    /// Borrow the role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

/// Ordered set of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleName>);

impl RoleSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set holds no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `role` is a member.
    #[must_use]
    pub fn contains(&self, role: &RoleName) -> bool {
        self.0.contains(role)
    }

    /// Whether the two sets share at least one role.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.0.iter().any(|role| other.0.contains(role))
    }

    /// Add a role, returning whether it was newly inserted.
    pub fn insert(&mut self, role: RoleName) -> bool {
        self.0.insert(role)
    }

    /// Remove a role, returning whether it was present.
    pub fn remove(&mut self, role: &RoleName) -> bool {
        self.0.remove(role)
    }

    /// Iterate over the roles in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.0.iter()
    }

    /// Comma separated role names, e.g. `admin, user`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(RoleName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<RoleName> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RoleSet {
    type Item = RoleName;
    type IntoIter = std::collections::btree_set::IntoIter<RoleName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
