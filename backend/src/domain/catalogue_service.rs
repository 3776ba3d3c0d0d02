//! Product catalogue service.
//!
//! Wraps a [`ProductRepository`] with pagination and admin operations. The
//! repository returns one slice plus the total match count; this service turns
//! that into a [`Page`] the HTTP layer can link.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::Page;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    ProductCatalog, ProductRepository, ProductRepositoryError, StockAdjustment,
};
use crate::domain::{Error, Product, ProductDraft, ProductId, ProductSearch};

fn map_repository_error(error: ProductRepositoryError) -> Error {
    match error {
        ProductRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("product repository unavailable: {message}"))
        }
        ProductRepositoryError::Query { message } => {
            Error::internal(format!("product repository error: {message}"))
        }
        ProductRepositoryError::NotFound { id } => {
            Error::not_found(format!("product {id} not found"))
        }
        ProductRepositoryError::Referenced { id } => Error::conflict(format!(
            "product {id} is still in carts or purchase history; delete with force to remove them"
        ))
        .with_details(json!({ "productId": id, "code": "product_referenced" })),
    }
}

/// Largest stock change accepted in either direction; stock is stored as a
/// 32-bit count.
pub const MAX_STOCK_DELTA: i64 = i32::MAX as i64;

/// Catalogue backed by a product repository.
#[derive(Clone)]
pub struct CatalogueService<P> {
    products: Arc<P>,
}

impl<P> CatalogueService<P> {
    /// Create a catalogue service.
    pub fn new(products: Arc<P>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl<P> ProductCatalog for CatalogueService<P>
where
    P: ProductRepository,
{
    async fn search(&self, search: &ProductSearch) -> Result<Page<Product>, Error> {
        let slice = self
            .products
            .search(search)
            .await
            .map_err(map_repository_error)?;
        debug!(
            term = ?search.term,
            page = search.page.page(),
            total = slice.total,
            "catalogue searched"
        );
        Ok(Page::new(slice.items, search.page, slice.total))
    }

    async fn product(&self, id: ProductId) -> Result<Product, Error> {
        self.products
            .find(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("product {id} not found")))
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, Error> {
        let product = self
            .products
            .insert(&draft)
            .await
            .map_err(map_repository_error)?;
        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> Result<Product, Error> {
        self.products
            .update(id, &draft)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("product {id} not found")))
    }

    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<StockAdjustment, Error> {
        if delta.unsigned_abs() > MAX_STOCK_DELTA.unsigned_abs() {
            return Err(Error::invalid_request(format!(
                "delta must be within -{MAX_STOCK_DELTA}..={MAX_STOCK_DELTA}"
            ))
            .with_details(json!({ "field": "delta", "code": "out_of_range" })));
        }
        let adjustment = self
            .products
            .adjust_stock(id, delta)
            .await
            .map_err(map_repository_error)?;
        if let StockAdjustment::Rejected { quantity } = adjustment {
            debug!(product_id = %id, delta, quantity, "stock adjustment rejected");
        }
        Ok(adjustment)
    }

    async fn delete_product(&self, id: ProductId, force: bool) -> Result<(), Error> {
        self.products
            .delete(id, force)
            .await
            .map_err(map_repository_error)?;
        info!(product_id = %id, force, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockProductRepository, ProductSlice};
    use crate::domain::Money;
    use rstest::rstest;

    fn mug(id: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Mug {id}"),
            description: "Ceramic".to_owned(),
            price: Some(Money::from_cents(999).expect("valid price")),
            quantity: Some(5),
        }
    }

    #[tokio::test]
    async fn search_wraps_slice_in_page() {
        let mut repo = MockProductRepository::new();
        repo.expect_search().times(1).return_once(|_| {
            Ok(ProductSlice {
                items: vec![mug(1), mug(2)],
                total: 12,
            })
        });
        let search = ProductSearch::from_parts(Some("mug"), Some(1), Some(2), None, None)
            .expect("valid search");

        let page = CatalogueService::new(Arc::new(repo))
            .search(&search)
            .await
            .expect("search succeeds");

        assert_eq!(page.items().len(), 2);
        assert_eq!(page.total_items(), 12);
        assert_eq!(page.total_pages(), 6);
        assert!(page.has_next());
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().times(1).return_once(|_| Ok(None));

        let error = CatalogueService::new(Arc::new(repo))
            .product(ProductId::new(9))
            .await
            .expect_err("missing");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn referenced_product_delete_is_conflict() {
        let mut repo = MockProductRepository::new();
        repo.expect_delete()
            .withf(|id, force| *id == ProductId::new(4) && !force)
            .times(1)
            .return_once(|_, _| Err(ProductRepositoryError::referenced(4_i64)));

        let error = CatalogueService::new(Arc::new(repo))
            .delete_product(ProductId::new(4), false)
            .await
            .expect_err("still referenced");

        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(
            error.details(),
            Some(&json!({ "productId": 4, "code": "product_referenced" }))
        );
    }

    #[tokio::test]
    async fn rejected_adjustment_is_reported_not_raised() {
        let mut repo = MockProductRepository::new();
        repo.expect_adjust_stock()
            .times(1)
            .return_once(|_, _| Ok(StockAdjustment::Rejected { quantity: 2 }));

        let adjustment = CatalogueService::new(Arc::new(repo))
            .adjust_stock(ProductId::new(4), -3)
            .await
            .expect("adjustment runs");

        assert_eq!(adjustment, StockAdjustment::Rejected { quantity: 2 });
    }

    #[rstest]
    #[case(i64::MAX)]
    #[case(i64::MIN)]
    #[case(MAX_STOCK_DELTA + 1)]
    #[case(-MAX_STOCK_DELTA - 1)]
    #[tokio::test]
    async fn oversized_adjustment_never_reaches_the_repository(#[case] delta: i64) {
        let mut repo = MockProductRepository::new();
        repo.expect_adjust_stock().times(0);

        let error = CatalogueService::new(Arc::new(repo))
            .adjust_stock(ProductId::new(4), delta)
            .await
            .expect_err("delta out of range");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.details(),
            Some(&json!({ "field": "delta", "code": "out_of_range" }))
        );
    }

    #[tokio::test]
    async fn largest_adjustment_is_passed_through() {
        let mut repo = MockProductRepository::new();
        repo.expect_adjust_stock()
            .withf(|_, delta| *delta == MAX_STOCK_DELTA)
            .times(1)
            .return_once(|_, _| Ok(StockAdjustment::Unlimited));

        let adjustment = CatalogueService::new(Arc::new(repo))
            .adjust_stock(ProductId::new(4), MAX_STOCK_DELTA)
            .await
            .expect("adjustment runs");

        assert_eq!(adjustment, StockAdjustment::Unlimited);
    }

    #[tokio::test]
    async fn update_of_missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_update().times(1).return_once(|_, _| Ok(None));
        let draft = ProductDraft::new("Mug", None, None, None).expect("valid draft");

        let error = CatalogueService::new(Arc::new(repo))
            .update_product(ProductId::new(4), draft)
            .await
            .expect_err("missing");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
