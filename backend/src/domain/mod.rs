//! Domain primitives, services and ports.
//!
//! Purpose: keep the storefront's business rules free of HTTP and SQL. Value
//! types validate on construction, services implement the driving ports in
//! [`ports`] on top of the driven repository ports, and adapters translate at
//! the edges.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Money, User, Product, CartLine, CheckoutOutcome: core records.
//! - evaluate_access / AccessGate: per-request role checks.
//! - *Service: driving port implementations.

pub mod access;
pub mod access_gate;
pub mod account_service;
pub mod auth;
pub mod cart;
pub mod cart_service;
pub mod catalogue;
pub mod catalogue_service;
pub mod checkout;
pub mod checkout_service;
pub mod credential_service;
pub mod error;
pub mod forms;
pub mod money;
pub mod ports;
pub mod product;
pub mod role;
pub mod role_service;
pub mod trace_id;
pub mod user;

pub use self::access::{AccessDecision, Identity, LOGIN_PATH, evaluate_access, safe_return_url};
pub use self::access_gate::AccessGate;
pub use self::account_service::AccountService;
pub use self::auth::{LoginCredentials, LoginValidationError, PasswordHash};
pub use self::cart::{AddToCartOutcome, CartLine, cart_total};
pub use self::cart_service::CartService;
pub use self::catalogue::{ProductSearch, SortColumn, SortDirection};
pub use self::catalogue_service::CatalogueService;
pub use self::checkout::{
    CheckoutOutcome, CheckoutPreview, CheckoutReceipt, INSUFFICIENT_FUNDS_MESSAGE, PurchaseRecord,
    PurchaseSummary, summarise_purchases,
};
pub use self::checkout_service::CheckoutService;
pub use self::credential_service::CredentialService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::forms::{AccountChanges, AccountUpdateForm, FormRejection, SignupForm};
pub use self::money::{Money, MoneyError};
pub use self::product::{Product, ProductDraft, ProductId, ProductPerk};
pub use self::role::{RoleName, RoleSet, RoleValidationError};
pub use self::role_service::RoleService;
pub use self::trace_id::TraceId;
pub use self::user::{
    LeaderboardEntry, Multiplier, User, UserId, UserValidationError, Username,
};

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, Error>;
