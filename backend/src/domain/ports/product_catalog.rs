//! Driving port for browsing and administering products.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{Error, Product, ProductDraft, ProductId, ProductSearch};

use super::StockAdjustment;

/// Use-case port over the product catalogue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Paginated search. A page past the end is empty, not an error.
    async fn search(&self, search: &ProductSearch) -> Result<Page<Product>, Error>;

    /// Fetch one product; not found when absent.
    async fn product(&self, id: ProductId) -> Result<Product, Error>;

    /// Create a product.
    async fn create_product(&self, draft: ProductDraft) -> Result<Product, Error>;

    /// Replace a product's fields; not found when absent.
    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> Result<Product, Error>;

    /// Increase or decrease tracked stock.
    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<StockAdjustment, Error>;

    /// Delete a product, cascading references only when `force` is set.
    async fn delete_product(&self, id: ProductId, force: bool) -> Result<(), Error>;
}
