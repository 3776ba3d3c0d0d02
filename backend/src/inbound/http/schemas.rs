//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the serialised shape of their corresponding
//! domain types but live in the inbound adapter layer where framework
//! concerns belong. Money is always a decimal string with two places.

#![expect(
    dead_code,
    reason = "Schema wrappers are used only for OpenAPI generation via utoipa"
)]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with current state.
    #[schema(rename = "conflict")]
    Conflict,
    /// Not enough stock to satisfy a reservation.
    #[schema(rename = "out_of_stock")]
    OutOfStock,
    /// The store could not be reached in time.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Fill in all fields correctly:")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(ToSchema)]
#[schema(as = crate::domain::User, rename_all = "camelCase")]
pub struct UserSchema {
    /// Stable account key.
    #[schema(example = 42)]
    id: i64,
    /// Unique login name.
    #[schema(example = "shopper1")]
    username: String,
    /// Contact email.
    #[schema(example = "shopper1@example.com")]
    email: String,
    /// Spendable balance.
    #[schema(example = "12.50")]
    balance: String,
    /// Earnings multiplier, at least 1.
    #[schema(example = 1)]
    multiplier: u32,
}

/// OpenAPI schema for [`crate::domain::LeaderboardEntry`].
#[derive(ToSchema)]
#[schema(as = crate::domain::LeaderboardEntry)]
pub struct LeaderboardEntrySchema {
    /// Account name.
    username: String,
    /// Current balance.
    #[schema(example = "120.00")]
    balance: String,
}

/// OpenAPI schema for [`crate::domain::Product`].
///
/// Products without a price, or with zero stock, are unlisted and only
/// visible to administrators.
#[derive(ToSchema)]
#[schema(as = crate::domain::Product)]
pub struct ProductSchema {
    /// Product key.
    id: i64,
    /// Display name, 1 to 100 characters.
    #[schema(example = "Multiplier + 1")]
    name: String,
    /// Free text, up to 1000 characters.
    description: String,
    /// Unit price; absent while not for sale.
    #[schema(example = "9.99")]
    price: Option<String>,
    /// Units in stock; absent when unlimited.
    quantity: Option<u32>,
}

/// OpenAPI schema for [`crate::domain::CartLine`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CartLine, rename_all = "camelCase")]
pub struct CartLineSchema {
    /// Reserved product.
    product_id: i64,
    /// Product name.
    name: String,
    /// Current unit price.
    unit_price: Option<String>,
    /// Units reserved by this cart.
    quantity: u32,
    /// Stock left after all reservations; absent when unlimited.
    remaining_stock: Option<u32>,
}

/// OpenAPI schema for [`crate::domain::AddToCartOutcome`].
#[derive(ToSchema)]
#[schema(as = crate::domain::AddToCartOutcome, rename_all = "camelCase")]
pub struct AddToCartOutcomeSchema {
    /// `reserved` or `outOfStock`.
    #[schema(example = "reserved")]
    status: String,
    /// Units now in the cart (reserved only).
    quantity_in_cart: Option<u32>,
    /// Stock left after the reservation (reserved only).
    remaining_stock: Option<u32>,
    /// Units asked for (out of stock only).
    requested: Option<u32>,
    /// Units available (out of stock only).
    available: Option<u32>,
}

/// OpenAPI schema for [`crate::domain::PurchaseRecord`].
#[derive(ToSchema)]
#[schema(as = crate::domain::PurchaseRecord, rename_all = "camelCase")]
pub struct PurchaseRecordSchema {
    product_id: i64,
    product_name: String,
    quantity: u32,
    /// RFC 3339 timestamp of the checkout.
    purchased_at: String,
}

/// OpenAPI schema for [`crate::domain::CheckoutOutcome`].
///
/// `completed` carries the receipt fields; `insufficientFunds` carries the
/// balance and the total that could not be covered.
#[derive(ToSchema)]
#[schema(as = crate::domain::CheckoutOutcome, rename_all = "camelCase")]
pub struct CheckoutOutcomeSchema {
    /// `completed` or `insufficientFunds`.
    #[schema(example = "completed")]
    status: String,
    /// Server-side total.
    total: String,
    /// Balance after the checkout, or the unchanged balance.
    balance: String,
    /// Multiplier after perks (completed only).
    multiplier: Option<u32>,
    /// Purchases recorded (completed only).
    purchases: Option<Vec<PurchaseRecordSchema>>,
}

/// OpenAPI schema for [`crate::domain::CheckoutPreview`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CheckoutPreview, rename_all = "camelCase")]
pub struct CheckoutPreviewSchema {
    lines: Vec<CartLineSchema>,
    total: String,
    balance: String,
    sufficient_funds: bool,
}

/// OpenAPI schema for [`crate::domain::PurchaseSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::PurchaseSummary, rename_all = "camelCase")]
pub struct PurchaseSummarySchema {
    product_id: i64,
    product_name: String,
    /// Units bought across all checkouts.
    total_quantity: u64,
    /// RFC 3339 timestamp of the latest purchase.
    last_purchased_at: String,
}

/// OpenAPI schema for [`crate::domain::ports::AccountDetails`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::AccountDetails)]
pub struct AccountDetailsSchema {
    user: UserSchema,
    /// Role names held.
    roles: Vec<String>,
    purchases: Vec<PurchaseSummarySchema>,
}

/// OpenAPI schema for [`crate::domain::ports::StockAdjustment`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::StockAdjustment)]
pub struct StockAdjustmentSchema {
    /// `applied`, `unlimited` or `rejected`.
    #[schema(example = "applied")]
    status: String,
    /// Quantity after the adjustment, or the untouched quantity.
    quantity: Option<u32>,
}
