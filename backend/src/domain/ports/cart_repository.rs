//! Driven port for cart lines and their stock reservations.

use async_trait::async_trait;

use crate::domain::{AddToCartOutcome, CartLine, ProductId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cart repository adapters.
    pub enum CartRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "cart repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "cart repository query failed: {message}",
        /// The product does not exist.
        ProductNotFound { id: i64 } => "product {id} not found",
        /// The product has no price and cannot be reserved.
        NotPurchasable { id: i64 } => "product {id} is not for sale",
    }
}

/// Port for cart state.
///
/// Implementations must apply each reservation and release as one atomic
/// unit: the cart line and the product stock change together or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Reserve `quantity` units: check stock, merge into the existing line or
    /// create one, and decrement tracked stock.
    async fn reserve(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddToCartOutcome, CartRepositoryError>;

    /// Delete the line and restore its quantity to tracked stock. Returns the
    /// released quantity, or `None` when there was no such line.
    async fn release(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<u32>, CartRepositoryError>;

    /// Cart lines joined with live product data, ordered by product id.
    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartRepositoryError>;

    /// Delete every line without restoring stock; returns the number removed.
    async fn clear(&self, user_id: UserId) -> Result<u64, CartRepositoryError>;
}
