//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`PasswordHasher`]) are implemented by
//! outbound adapters. Driving ports ([`CredentialStore`], [`RoleStore`],
//! [`ProductCatalog`], [`CartEngine`], [`CheckoutLedger`], [`Accounts`]) are
//! implemented by domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod accounts;
mod cart_engine;
mod cart_repository;
mod checkout_ledger;
mod credential_store;
mod ledger_repository;
mod password_hasher;
mod product_catalog;
mod product_repository;
mod role_repository;
mod role_store;
mod user_repository;

#[cfg(test)]
pub use accounts::MockAccounts;
pub use accounts::{AccountDetails, Accounts};
pub use cart_engine::CartEngine;
#[cfg(test)]
pub use cart_engine::MockCartEngine;
#[cfg(test)]
pub use cart_repository::MockCartRepository;
pub use cart_repository::{CartRepository, CartRepositoryError};
pub use checkout_ledger::CheckoutLedger;
#[cfg(test)]
pub use checkout_ledger::MockCheckoutLedger;
pub use credential_store::CredentialStore;
#[cfg(test)]
pub use credential_store::MockCredentialStore;
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
pub use ledger_repository::{
    LedgerRepository, LedgerRepositoryError, Settlement, SettlementLine, SettlementOutcome,
};
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use product_catalog::MockProductCatalog;
pub use product_catalog::ProductCatalog;
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{
    ProductRepository, ProductRepositoryError, ProductSlice, StockAdjustment,
};
#[cfg(test)]
pub use role_repository::MockRoleRepository;
pub use role_repository::{RoleRepository, RoleRepositoryError};
#[cfg(test)]
pub use role_store::MockRoleStore;
pub use role_store::RoleStore;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{NewUser, StoredCredentials, UserRepository, UserRepositoryError};
