//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one driven port from
//! [`crate::domain::ports`] over a shared [`DbPool`].
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic units of work**: reservations, releases, settlement and forced
//!   product deletion each run in one transaction.
//!
//! # Example
//!
//! ```ignore
//! use storefront::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/storefront")).await?;
//! let users = DieselUserRepository::new(pool.clone());
//! ```

mod diesel_cart_repository;
mod diesel_error_mapping;
mod diesel_ledger_repository;
mod diesel_product_repository;
mod diesel_role_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_cart_repository::DieselCartRepository;
pub use diesel_ledger_repository::DieselLedgerRepository;
pub use diesel_product_repository::DieselProductRepository;
pub use diesel_role_repository::DieselRoleRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, PoolStatus};
