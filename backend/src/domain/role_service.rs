//! Role store service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{RoleRepository, RoleRepositoryError, RoleStore};
use crate::domain::{Error, RoleName, RoleSet, UserId};

fn map_repository_error(error: RoleRepositoryError) -> Error {
    match error {
        RoleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("role repository unavailable: {message}"))
        }
        RoleRepositoryError::Query { message } => {
            Error::internal(format!("role repository error: {message}"))
        }
        RoleRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        RoleRepositoryError::RoleNotFound { role } => {
            Error::not_found(format!("role '{role}' not found"))
        }
    }
}

/// Role store backed by a role repository.
///
/// Grants and revocations are idempotent: repeating either is not an error.
#[derive(Clone)]
pub struct RoleService<R> {
    roles: Arc<R>,
}

impl<R> RoleService<R> {
    /// Create a role service.
    pub fn new(roles: Arc<R>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl<R> RoleStore for RoleService<R>
where
    R: RoleRepository,
{
    async fn grant_role(&self, user_id: UserId, role: &RoleName) -> Result<(), Error> {
        let granted = self
            .roles
            .grant(user_id, role)
            .await
            .map_err(map_repository_error)?;
        if granted {
            info!(%user_id, %role, "role granted");
        }
        Ok(())
    }

    async fn revoke_role(&self, user_id: UserId, role: &RoleName) -> Result<(), Error> {
        let revoked = self
            .roles
            .revoke(user_id, role)
            .await
            .map_err(map_repository_error)?;
        if revoked {
            info!(%user_id, %role, "role revoked");
        }
        Ok(())
    }

    async fn list_roles(&self, user_id: UserId) -> Result<RoleSet, Error> {
        self.roles
            .roles_for(user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn has_role(&self, user_id: UserId, role: &RoleName) -> Result<bool, Error> {
        Ok(self.list_roles(user_id).await?.contains(role))
    }
}
