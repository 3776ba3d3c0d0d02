//! Driving port for role membership.

use async_trait::async_trait;

use crate::domain::{Error, RoleName, RoleSet, UserId};

/// Use-case port associating users with named roles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Grant a role. Granting an already held role is a no-op; unknown users
    /// or role names are not found.
    async fn grant_role(&self, user_id: UserId, role: &RoleName) -> Result<(), Error>;

    /// Revoke a role. Revoking a role that is not held is a no-op; unknown
    /// users or role names are not found.
    async fn revoke_role(&self, user_id: UserId, role: &RoleName) -> Result<(), Error>;

    /// Roles held by the user; empty for unknown users.
    async fn list_roles(&self, user_id: UserId) -> Result<RoleSet, Error>;

    /// Whether the user holds `role`.
    async fn has_role(&self, user_id: UserId, role: &RoleName) -> Result<bool, Error>;
}
