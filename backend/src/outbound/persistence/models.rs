//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types validate
//! stored values, so a row that violates a domain invariant surfaces as a
//! [`RowError`] rather than a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    CartLine, LeaderboardEntry, Money, Multiplier, Product, ProductId, PurchaseRecord, User,
    UserId, Username,
};

use super::schema::{cart_items, products, purchases, users};

/// A stored value that does not satisfy its domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stored {column}: {reason}")]
pub(crate) struct RowError {
    pub column: &'static str,
    pub reason: String,
}

impl RowError {
    fn new(column: &'static str, reason: impl ToString) -> Self {
        Self {
            column,
            reason: reason.to_string(),
        }
    }
}

pub(crate) fn money(column: &'static str, cents: i64) -> Result<Money, RowError> {
    Money::from_cents(cents).map_err(|err| RowError::new(column, err))
}

pub(crate) fn count(column: &'static str, value: i32) -> Result<u32, RowError> {
    u32::try_from(value).map_err(|err| RowError::new(column, err))
}

pub(crate) fn username(value: &str) -> Result<Username, RowError> {
    Username::new(value).map_err(|err| RowError::new("username", err))
}

pub(crate) fn multiplier(value: i32) -> Result<Multiplier, RowError> {
    let value = count("multiplier", value)?;
    Multiplier::new(value).map_err(|err| RowError::new("multiplier", err))
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub balance_cents: i64,
    pub multiplier: i32,
}

impl UserRow {
    pub(crate) fn to_user(&self) -> Result<User, RowError> {
        Ok(User {
            id: UserId::new(self.id),
            username: username(&self.username)?,
            email: self.email.clone(),
            balance: money("balance_cents", self.balance_cents)?,
            multiplier: multiplier(self.multiplier)?,
        })
    }
}

/// Insertable struct for creating new accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Row struct for leaderboard reads.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LeaderboardRow {
    pub username: String,
    pub balance_cents: i64,
}

impl TryFrom<LeaderboardRow> for LeaderboardEntry {
    type Error = RowError;

    fn try_from(row: LeaderboardRow) -> Result<Self, Self::Error> {
        Ok(Self {
            username: username(&row.username)?,
            balance: money("balance_cents", row.balance_cents)?,
        })
    }
}

/// Row struct for reading from the products table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_cents: Option<i64>,
    pub quantity: Option<i32>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RowError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row
                .price_cents
                .map(|cents| money("price_cents", cents))
                .transpose()?,
            quantity: row
                .quantity
                .map(|value| count("quantity", value))
                .transpose()?,
        })
    }
}

/// Insert and full-replace payload for products.
///
/// `None` writes NULL so an update can withdraw a price or lift a stock limit.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProductWrite<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price_cents: Option<i64>,
    pub quantity: Option<i32>,
}

/// Cart line joined with its product.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct CartLineRow {
    pub product_id: i64,
    pub name: String,
    pub price_cents: Option<i64>,
    pub quantity: i32,
    pub stock: Option<i32>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RowError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            unit_price: row
                .price_cents
                .map(|cents| money("price_cents", cents))
                .transpose()?,
            quantity: count("cart_items.quantity", row.quantity)?,
            remaining_stock: row
                .stock
                .map(|value| count("products.quantity", value))
                .transpose()?,
        })
    }
}

/// Insertable struct for new cart lines.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cart_items)]
pub(crate) struct NewCartItemRow {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// Insertable struct for purchase records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub purchased_at: DateTime<Utc>,
}

/// Purchase joined with the product name.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct PurchaseRow {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub purchased_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = RowError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: count("purchases.quantity", row.quantity)?,
            purchased_at: row.purchased_at,
        })
    }
}
