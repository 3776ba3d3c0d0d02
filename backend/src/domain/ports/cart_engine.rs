//! Driving port for cart mutations.

use async_trait::async_trait;

use crate::domain::{AddToCartOutcome, CartLine, Error, ProductId, UserId};

/// Use-case port over per-user carts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartEngine: Send + Sync {
    /// Reserve stock and add it to the cart. Insufficient stock is reported
    /// as [`AddToCartOutcome::OutOfStock`] with nothing changed.
    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddToCartOutcome, Error>;

    /// Remove a line and restore its stock; returns the restored quantity.
    async fn remove_from_cart(&self, user_id: UserId, product_id: ProductId)
    -> Result<u32, Error>;

    /// Cart lines with live product data.
    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, Error>;

    /// Drop every line without restoring stock.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), Error>;
}
