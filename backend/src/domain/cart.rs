//! Cart lines and reservation outcomes.
//!
//! Adding to the cart reserves stock immediately: the product quantity is
//! decremented when the line is created or grown and restored when the line
//! is removed. Checkout consumes the reservation without touching stock again.

use serde::{Deserialize, Serialize};

use super::{Error, Money, ProductId};

/// One product in a user's cart, joined with its live product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Reserved product.
    pub product_id: ProductId,
    /// Product name at read time.
    pub name: String,
    /// Current unit price; absent when the product was withdrawn from sale.
    pub unit_price: Option<Money>,
    /// Units reserved by this cart.
    pub quantity: u32,
    /// Stock left after all reservations; absent when unlimited.
    pub remaining_stock: Option<u32>,
}

impl CartLine {
    /// Price of the whole line.
    pub fn line_total(&self) -> Result<Money, Error> {
        let price = self.unit_price.ok_or_else(|| {
            Error::conflict(format!("{} is no longer for sale", self.name)).with_details(
                serde_json::json!({ "productId": self.product_id, "code": "not_purchasable" }),
            )
        })?;
        price
            .checked_mul(self.quantity)
            .ok_or_else(|| Error::invalid_request("cart total is too large"))
    }
}

/// Sum of all line totals, computed from live prices.
pub fn cart_total(lines: &[CartLine]) -> Result<Money, Error> {
    lines.iter().try_fold(Money::ZERO, |total, line| {
        total
            .checked_add(line.line_total()?)
            .ok_or_else(|| Error::invalid_request("cart total is too large"))
    })
}

/// Result of an add-to-cart attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AddToCartOutcome {
    /// Stock was reserved and the cart line created or grown.
    #[serde(rename_all = "camelCase")]
    Reserved {
        /// Units now in the cart for this product.
        quantity_in_cart: u32,
        /// Stock left after the reservation; absent when unlimited.
        remaining_stock: Option<u32>,
    },
    /// Not enough stock; nothing changed.
    #[serde(rename_all = "camelCase")]
    OutOfStock {
        /// Units the caller asked for.
        requested: u32,
        /// Units that were available.
        available: u32,
    },
}

impl AddToCartOutcome {
    /// Whether the reservation succeeded.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }
}
