//! Driven port for the product catalogue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Product, ProductDraft, ProductId, ProductSearch};

use super::define_port_error;

define_port_error! {
    /// Errors raised by product repository adapters.
    pub enum ProductRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "product repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "product repository query failed: {message}",
        /// The product does not exist.
        NotFound { id: i64 } => "product {id} not found",
        /// Cart lines or purchases still reference the product.
        Referenced { id: i64 } => "product {id} is referenced by carts or purchases",
    }
}

/// One page of search results plus the total match count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSlice {
    /// Products on the requested page.
    pub items: Vec<Product>,
    /// Matches across all pages.
    pub total: u64,
}

/// Result of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StockAdjustment {
    /// The new quantity was stored.
    Applied {
        /// Quantity after the adjustment.
        quantity: u32,
    },
    /// The product has unlimited stock; nothing changed.
    Unlimited,
    /// A decrease would have gone below zero; nothing changed.
    Rejected {
        /// Quantity left untouched.
        quantity: u32,
    },
}

/// Port for product records and stock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Case-insensitive search over name and description.
    async fn search(&self, search: &ProductSearch) -> Result<ProductSlice, ProductRepositoryError>;

    /// Fetch one product.
    async fn find(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError>;

    /// Insert a product.
    async fn insert(&self, draft: &ProductDraft) -> Result<Product, ProductRepositoryError>;

    /// Replace a product's fields; `None` when it does not exist.
    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, ProductRepositoryError>;

    /// Apply `delta` to the stock with a conditional update.
    ///
    /// Fails with [`ProductRepositoryError::NotFound`] for unknown products.
    async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i64,
    ) -> Result<StockAdjustment, ProductRepositoryError>;

    /// Delete a product. Without `force`, fails with
    /// [`ProductRepositoryError::Referenced`] while cart lines or purchases
    /// point at it; with `force`, deletes those references first.
    async fn delete(&self, id: ProductId, force: bool) -> Result<(), ProductRepositoryError>;
}
