//! Cart engine service.
//!
//! Stock is reserved when a line is added and returned when it is removed;
//! the repository performs each of those as one atomic step.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{CartEngine, CartRepository, CartRepositoryError};
use crate::domain::{AddToCartOutcome, CartLine, Error, ProductId, UserId};

fn map_repository_error(error: CartRepositoryError) -> Error {
    match error {
        CartRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("cart repository unavailable: {message}"))
        }
        CartRepositoryError::Query { message } => {
            Error::internal(format!("cart repository error: {message}"))
        }
        CartRepositoryError::ProductNotFound { id } => {
            Error::not_found(format!("product {id} not found"))
        }
        CartRepositoryError::NotPurchasable { id } => {
            Error::invalid_request(format!("product {id} is not for sale"))
                .with_details(json!({ "productId": id, "code": "not_purchasable" }))
        }
    }
}

/// Cart engine backed by a cart repository.
#[derive(Clone)]
pub struct CartService<C> {
    carts: Arc<C>,
}

impl<C> CartService<C> {
    /// Create a cart service.
    pub fn new(carts: Arc<C>) -> Self {
        Self { carts }
    }
}

#[async_trait]
impl<C> CartEngine for CartService<C>
where
    C: CartRepository,
{
    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddToCartOutcome, Error> {
        if quantity == 0 {
            return Err(Error::invalid_request("quantity must be at least 1")
                .with_details(json!({ "field": "quantity" })));
        }
        let outcome = self
            .carts
            .reserve(user_id, product_id, quantity)
            .await
            .map_err(map_repository_error)?;
        match outcome {
            AddToCartOutcome::Reserved {
                quantity_in_cart, ..
            } => debug!(%user_id, %product_id, quantity, quantity_in_cart, "stock reserved"),
            AddToCartOutcome::OutOfStock { available, .. } => {
                debug!(%user_id, %product_id, quantity, available, "reservation refused");
            }
        }
        Ok(outcome)
    }

    async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<u32, Error> {
        let released = self
            .carts
            .release(user_id, product_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("product {product_id} is not in the cart")))?;
        debug!(%user_id, %product_id, released, "reservation released");
        Ok(released)
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, Error> {
        self.carts
            .lines(user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), Error> {
        let removed = self
            .carts
            .clear(user_id)
            .await
            .map_err(map_repository_error)?;
        debug!(%user_id, removed, "cart cleared");
        Ok(())
    }
}
