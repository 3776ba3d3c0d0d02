//! Builders for the HTTP state and start-up data.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use storefront::domain::{Error, RoleName, SignupForm, Username};
use storefront::inbound::http::state::{HttpState, HttpStatePorts, Repositories};
use storefront::outbound::hashing::BcryptPasswordHasher;
use storefront::outbound::memory::InMemoryStore;
use storefront::outbound::persistence::{
    DbPool, DieselCartRepository, DieselLedgerRepository, DieselProductRepository,
    DieselRoleRepository, DieselUserRepository,
};

use super::ServerConfig;
use super::settings::AdminAccount;

/// Domain services over PostgreSQL when a pool is configured, otherwise
/// over a process-local store.
fn build_ports(db_pool: Option<&DbPool>) -> HttpStatePorts {
    let hasher = Arc::new(BcryptPasswordHasher::new());
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    match db_pool {
        Some(pool) => HttpStatePorts::from_repositories(
            Repositories {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                roles: Arc::new(DieselRoleRepository::new(pool.clone())),
                products: Arc::new(DieselProductRepository::new(pool.clone())),
                carts: Arc::new(DieselCartRepository::new(pool.clone())),
                ledger: Arc::new(DieselLedgerRepository::new(pool.clone())),
            },
            hasher,
            clock,
        ),
        None => {
            warn!("no database configured; data lives in memory and is lost on exit");
            let store = Arc::new(InMemoryStore::new());
            HttpStatePorts::from_repositories(
                Repositories {
                    users: store.clone(),
                    roles: store.clone(),
                    products: store.clone(),
                    carts: store.clone(),
                    ledger: store,
                },
                hasher,
                clock,
            )
        }
    }
}

/// Build the shared HTTP state from the configured stores.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = HttpState::new(build_ports(config.db_pool.as_ref()))
        .with_request_timeout(config.request_timeout);
    web::Data::new(state)
}

/// Ensure the configured administrator exists and holds `admin`.
///
/// An existing account keeps its password; only the role is granted.
pub async fn bootstrap_admin(state: &HttpState, admin: &AdminAccount) -> Result<(), Error> {
    let username = Username::new(&admin.username)
        .map_err(|err| Error::invalid_request(format!("admin_username: {err}")))?;
    let user = match state.credentials.find_user(&username).await? {
        Some(user) => user,
        None => {
            let created = state
                .accounts
                .signup(SignupForm {
                    username: admin.username.clone(),
                    email: format!("{}@localhost", admin.username),
                    password: admin.password.clone(),
                    confirm_password: admin.password.clone(),
                })
                .await?;
            info!(username = %created.username.as_str(), "created bootstrap administrator");
            created
        }
    };
    state.roles.grant_role(user.id, &RoleName::admin()).await
}
