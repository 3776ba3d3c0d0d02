//! Access gate service.
//!
//! Resolves the username carried by a session into an [`Identity`] and applies
//! [`evaluate_access`] for the roles a route requires.

use std::sync::Arc;

use crate::domain::ports::{CredentialStore, RoleStore};
use crate::domain::{AccessDecision, Error, Identity, RoleSet, Username, evaluate_access};

/// Resolves session identities and authorises requests.
#[derive(Clone)]
pub struct AccessGate {
    credentials: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
}

impl AccessGate {
    /// Create a gate over the credential and role stores.
    pub fn new(credentials: Arc<dyn CredentialStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { credentials, roles }
    }

    /// Identity for a session username.
    ///
    /// Returns `None` for anonymous sessions and for sessions naming an
    /// account that no longer exists.
    pub async fn resolve(&self, username: Option<&Username>) -> Result<Option<Identity>, Error> {
        let Some(username) = username else {
            return Ok(None);
        };
        let Some(user) = self.credentials.find_user(username).await? else {
            return Ok(None);
        };
        let roles = self.roles.list_roles(user.id).await?;
        Ok(Some(Identity {
            user_id: user.id,
            username: user.username,
            roles,
        }))
    }

    /// Decide whether the session may reach `requested`.
    pub async fn authorise(
        &self,
        username: Option<&Username>,
        required: &RoleSet,
        requested: &str,
    ) -> Result<AccessDecision, Error> {
        if required.is_empty() && username.is_none() {
            return Ok(AccessDecision::Allow(None));
        }
        let identity = self.resolve(username).await?;
        Ok(evaluate_access(required, identity, requested))
    }
}
