//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::warn;

use crate::domain::ports::{
    Accounts, CartEngine, CartRepository, CheckoutLedger, CredentialStore, LedgerRepository,
    PasswordHasher, ProductCatalog, ProductRepository, RoleRepository, RoleStore, UserRepository,
};
use crate::domain::{
    AccessGate, AccountService, CartService, CatalogueService, CheckoutService, CredentialService,
    Error, RoleService,
};

/// Request budget applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Parameter object bundling the driving ports used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub credentials: Arc<dyn CredentialStore>,
    pub roles: Arc<dyn RoleStore>,
    pub catalogue: Arc<dyn ProductCatalog>,
    pub cart: Arc<dyn CartEngine>,
    pub checkout: Arc<dyn CheckoutLedger>,
    pub accounts: Arc<dyn Accounts>,
}

/// Driven adapters the domain services are built on.
pub struct Repositories<U, R, P, C, L> {
    pub users: Arc<U>,
    pub roles: Arc<R>,
    pub products: Arc<P>,
    pub carts: Arc<C>,
    pub ledger: Arc<L>,
}

impl HttpStatePorts {
    /// Build every domain service over one set of driven adapters.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use storefront::inbound::http::state::{HttpState, HttpStatePorts, Repositories};
    /// use storefront::outbound::hashing::BcryptPasswordHasher;
    /// use storefront::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let ports = HttpStatePorts::from_repositories(
    ///     Repositories {
    ///         users: store.clone(),
    ///         roles: store.clone(),
    ///         products: store.clone(),
    ///         carts: store.clone(),
    ///         ledger: store,
    ///     },
    ///     Arc::new(BcryptPasswordHasher::with_cost(4)),
    ///     Arc::new(DefaultClock),
    /// );
    /// let _state = HttpState::new(ports);
    /// ```
    pub fn from_repositories<U, R, P, C, L, H>(
        repositories: Repositories<U, R, P, C, L>,
        hasher: Arc<H>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        U: UserRepository + 'static,
        R: RoleRepository + 'static,
        P: ProductRepository + 'static,
        C: CartRepository + 'static,
        L: LedgerRepository + 'static,
        H: PasswordHasher + 'static,
    {
        let Repositories {
            users,
            roles,
            products,
            carts,
            ledger,
        } = repositories;
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(CredentialService::new(users.clone(), hasher));
        let roles: Arc<dyn RoleStore> = Arc::new(RoleService::new(roles));
        let catalogue: Arc<dyn ProductCatalog> = Arc::new(CatalogueService::new(products));
        let cart: Arc<dyn CartEngine> = Arc::new(CartService::new(carts.clone()));
        let checkout: Arc<dyn CheckoutLedger> =
            Arc::new(CheckoutService::new(carts, ledger, clock));
        let accounts: Arc<dyn Accounts> = Arc::new(AccountService::new(
            credentials.clone(),
            roles.clone(),
            checkout.clone(),
            users,
        ));
        Self {
            credentials,
            roles,
            catalogue,
            cart,
            checkout,
            accounts,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub credentials: Arc<dyn CredentialStore>,
    pub roles: Arc<dyn RoleStore>,
    pub catalogue: Arc<dyn ProductCatalog>,
    pub cart: Arc<dyn CartEngine>,
    pub checkout: Arc<dyn CheckoutLedger>,
    pub accounts: Arc<dyn Accounts>,
    pub access: AccessGate,
    request_timeout: Duration,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from the driving ports.
    ///
    /// The access gate is built over the same credential and role stores
    /// the handlers use.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            credentials,
            roles,
            catalogue,
            cart,
            checkout,
            accounts,
        } = ports;
        let access = AccessGate::new(credentials.clone(), roles.clone());
        Self {
            credentials,
            roles,
            catalogue,
            cart,
            checkout,
            accounts,
            access,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replace the per-request budget.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Budget applied by [`HttpState::bounded`].
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Run a port call under the request budget.
    ///
    /// An elapsed budget drops `call`, which returns its pooled connection
    /// and rolls back any open transaction, and reports the store as
    /// unavailable.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = self.request_timeout.as_millis(),
                    "request exceeded its time budget"
                );
                Err(Error::service_unavailable(
                    "the store did not respond in time; please retry",
                ))
            }
        }
    }
}
