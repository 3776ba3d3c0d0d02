//! PostgreSQL-backed `ProductRepository` implementation using Diesel ORM.
//!
//! Search terms are bound as `ILIKE` parameters with `%`, `_` and `\` escaped,
//! and ordering is chosen from a closed set of column expressions, so no
//! request value is ever spliced into SQL.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{
    ProductRepository, ProductRepositoryError, ProductSlice, StockAdjustment,
};
use crate::domain::{
    Product, ProductDraft, ProductId, ProductSearch, SortColumn, SortDirection,
};

use super::diesel_error_mapping::{
    TxError, is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
    map_row_error,
};
use super::models::{self, ProductRow, ProductWrite, RowError};
use super::pool::{DbPool, PoolError};
use super::schema::{cart_items, products, purchases};

diesel::define_sql_function! {
    /// SQL `lower(text)`, used for case-insensitive ordering.
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

/// Diesel-backed implementation of the `ProductRepository` port.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProductRepositoryError {
    map_basic_pool_error(error, ProductRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProductRepositoryError {
    map_basic_diesel_error(
        error,
        ProductRepositoryError::query,
        ProductRepositoryError::connection,
    )
}

fn map_invalid_row(error: RowError) -> ProductRepositoryError {
    map_row_error(error, ProductRepositoryError::query)
}

fn into_product(row: ProductRow) -> Result<Product, ProductRepositoryError> {
    Product::try_from(row).map_err(map_invalid_row)
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn write_row(draft: &ProductDraft) -> Result<ProductWrite<'_>, ProductRepositoryError> {
    let quantity = draft
        .quantity()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| ProductRepositoryError::query("quantity exceeds storage range"))?;
    Ok(ProductWrite {
        name: draft.name(),
        description: draft.description(),
        price_cents: draft.price().map(|price| price.cents()),
        quantity,
    })
}

fn filtered(search: &ProductSearch) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table.into_boxed();
    if let Some(term) = search.normalised_term() {
        let pattern = format!("%{}%", escape_like(&term));
        query = query.filter(
            products::name
                .ilike(pattern.clone())
                .or(products::description.ilike(pattern)),
        );
    }
    if !search.include_unlisted {
        query = query
            .filter(products::price_cents.is_not_null())
            .filter(products::quantity.is_null().or(products::quantity.ne(0)));
    }
    query
}

fn ordered(
    query: products::BoxedQuery<'static, Pg>,
    column: SortColumn,
    direction: SortDirection,
) -> products::BoxedQuery<'static, Pg> {
    use SortDirection::{Ascending, Descending};

    let query = match (column, direction) {
        (SortColumn::Id, Ascending) => query.order_by(products::id.asc()),
        (SortColumn::Id, Descending) => query.order_by(products::id.desc()),
        (SortColumn::Name, Ascending) => query.order_by(lower(products::name).asc()),
        (SortColumn::Name, Descending) => query.order_by(lower(products::name).desc()),
        (SortColumn::Description, Ascending) => {
            query.order_by(lower(products::description).asc())
        }
        (SortColumn::Description, Descending) => {
            query.order_by(lower(products::description).desc())
        }
        (SortColumn::Price, Ascending) => query.order_by(products::price_cents.asc()),
        (SortColumn::Price, Descending) => query.order_by(products::price_cents.desc()),
        (SortColumn::Quantity, Ascending) => query.order_by(products::quantity.asc()),
        (SortColumn::Quantity, Descending) => query.order_by(products::quantity.desc()),
    };
    query.then_order_by(products::id.asc())
}

fn to_offset(value: u64) -> Result<i64, ProductRepositoryError> {
    i64::try_from(value).map_err(|_| ProductRepositoryError::query("page offset out of range"))
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn search(&self, search: &ProductSearch) -> Result<ProductSlice, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = filtered(search)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<ProductRow> = ordered(filtered(search), search.order_by, search.direction)
            .offset(to_offset(search.page.offset())?)
            .limit(to_offset(search.page.limit())?)
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(ProductSlice {
            items: rows
                .into_iter()
                .map(into_product)
                .collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        products::table
            .find(id.get())
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(into_product)
            .transpose()
    }

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, ProductRepositoryError> {
        let row = write_row(draft)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored = diesel::insert_into(products::table)
            .values(&row)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        into_product(stored)
    }

    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, ProductRepositoryError> {
        let row = write_row(draft)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(products::table.find(id.get()))
            .set(&row)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(into_product)
            .transpose()
    }

    async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i64,
    ) -> Result<StockAdjustment, ProductRepositoryError> {
        let delta = i32::try_from(delta)
            .ok()
            .filter(|delta| *delta != i32::MIN)
            .ok_or_else(|| ProductRepositoryError::query("stock adjustment out of range"))?;
        let (floor, ceiling) = adjustable_range(delta);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let applied: Option<Option<i32>> = diesel::update(
            products::table
                .find(id.get())
                .filter(products::quantity.between(floor, ceiling)),
        )
        .set(products::quantity.eq(products::quantity + delta))
        .returning(products::quantity)
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        if let Some(Some(quantity)) = applied {
            return Ok(StockAdjustment::Applied {
                quantity: models::count("quantity", quantity).map_err(map_invalid_row)?,
            });
        }

        let current: Option<Option<i32>> = products::table
            .find(id.get())
            .select(products::quantity)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        match current {
            None => Err(ProductRepositoryError::not_found(id.get())),
            Some(None) => Ok(StockAdjustment::Unlimited),
            Some(Some(quantity)) => Ok(StockAdjustment::Rejected {
                quantity: models::count("quantity", quantity).map_err(map_invalid_row)?,
            }),
        }
    }

    async fn delete(&self, id: ProductId, force: bool) -> Result<(), ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let product_id = id.get();

        conn.transaction::<_, TxError<ProductRepositoryError>, _>(|conn| {
            async move {
                if force {
                    diesel::delete(cart_items::table.filter(cart_items::product_id.eq(product_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(purchases::table.filter(purchases::product_id.eq(product_id)))
                        .execute(conn)
                        .await?;
                } else {
                    let in_carts: i64 = cart_items::table
                        .filter(cart_items::product_id.eq(product_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    let purchased: i64 = purchases::table
                        .filter(purchases::product_id.eq(product_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if in_carts + purchased > 0 {
                        return Err(TxError::Domain(ProductRepositoryError::referenced(
                            product_id,
                        )));
                    }
                }

                let deleted = diesel::delete(products::table.find(product_id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(TxError::Domain(ProductRepositoryError::not_found(
                        product_id,
                    )));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(|error| map_delete_error(error, id)))
    }
}

fn map_delete_error(error: diesel::result::Error, id: ProductId) -> ProductRepositoryError {
    // A concurrent reservation can add a reference after the count check.
    if is_foreign_key_violation(&error) {
        ProductRepositoryError::referenced(id.get())
    } else {
        map_diesel_error(error)
    }
}

/// Current quantities that `delta` can move without leaving `0..=i32::MAX`.
fn adjustable_range(delta: i32) -> (i32, i32) {
    (delta.saturating_neg().max(0), i32::MAX - delta.max(0))
}
