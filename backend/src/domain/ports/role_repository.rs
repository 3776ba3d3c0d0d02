//! Driven port for role grants.

use async_trait::async_trait;

use crate::domain::{RoleName, RoleSet, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by role repository adapters.
    pub enum RoleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "role repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "role repository query failed: {message}",
        /// The user does not exist.
        UserNotFound { user_id: i64 } => "user {user_id} not found",
        /// The role name is not defined.
        RoleNotFound { role: String } => "role '{role}' not found",
    }
}

/// Port for the user-role association.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Grant `role`; returns `false` when it was already granted.
    async fn grant(&self, user_id: UserId, role: &RoleName) -> Result<bool, RoleRepositoryError>;

    /// Revoke `role`; returns `false` when it was not granted.
    async fn revoke(&self, user_id: UserId, role: &RoleName) -> Result<bool, RoleRepositoryError>;

    /// Roles granted to `user_id`; empty for unknown users.
    async fn roles_for(&self, user_id: UserId) -> Result<RoleSet, RoleRepositoryError>;
}
