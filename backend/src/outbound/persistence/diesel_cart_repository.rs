//! PostgreSQL-backed `CartRepository` implementation using Diesel ORM.
//!
//! Reservations lock the product row with `SELECT ... FOR UPDATE`, so two
//! shoppers racing for the last unit serialise on that row and the loser sees
//! the decremented stock.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{CartRepository, CartRepositoryError};
use crate::domain::{AddToCartOutcome, CartLine, ProductId, UserId};

use super::diesel_error_mapping::{
    TxError, map_basic_diesel_error, map_basic_pool_error, map_row_error,
};
use super::models::{self, CartLineRow, NewCartItemRow, RowError};
use super::pool::{DbPool, PoolError};
use super::schema::{cart_items, products};

/// Diesel-backed implementation of the `CartRepository` port.
#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CartRepositoryError {
    map_basic_pool_error(error, CartRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CartRepositoryError {
    map_basic_diesel_error(
        error,
        CartRepositoryError::query,
        CartRepositoryError::connection,
    )
}

fn map_invalid_row(error: RowError) -> CartRepositoryError {
    map_row_error(error, CartRepositoryError::query)
}

fn stored_count(column: &'static str, value: i32) -> Result<u32, TxError<CartRepositoryError>> {
    models::count(column, value).map_err(|err| TxError::Domain(map_invalid_row(err)))
}

#[async_trait]
impl CartRepository for DieselCartRepository {
    async fn reserve(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddToCartOutcome, CartRepositoryError> {
        let requested = i32::try_from(quantity)
            .map_err(|_| CartRepositoryError::query("quantity exceeds storage range"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<CartRepositoryError>, _>(|conn| {
            async move {
                let product: Option<(Option<i64>, Option<i32>)> = products::table
                    .find(product_id.get())
                    .select((products::price_cents, products::quantity))
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some((price_cents, stock)) = product else {
                    return Err(TxError::Domain(CartRepositoryError::product_not_found(
                        product_id.get(),
                    )));
                };
                if price_cents.is_none() {
                    return Err(TxError::Domain(CartRepositoryError::not_purchasable(
                        product_id.get(),
                    )));
                }

                let remaining_stock = match stock {
                    Some(available) if available < requested => {
                        return Ok(AddToCartOutcome::OutOfStock {
                            requested: quantity,
                            available: stored_count("products.quantity", available)?,
                        });
                    }
                    Some(available) => {
                        diesel::update(products::table.find(product_id.get()))
                            .set(products::quantity.eq(products::quantity - requested))
                            .execute(conn)
                            .await?;
                        Some(stored_count("products.quantity", available - requested)?)
                    }
                    None => None,
                };

                let in_cart: i32 = diesel::insert_into(cart_items::table)
                    .values(&NewCartItemRow {
                        user_id: user_id.get(),
                        product_id: product_id.get(),
                        quantity: requested,
                    })
                    .on_conflict((cart_items::user_id, cart_items::product_id))
                    .do_update()
                    .set(
                        cart_items::quantity
                            .eq(cart_items::quantity + excluded(cart_items::quantity)),
                    )
                    .returning(cart_items::quantity)
                    .get_result(conn)
                    .await?;

                Ok(AddToCartOutcome::Reserved {
                    quantity_in_cart: stored_count("cart_items.quantity", in_cart)?,
                    remaining_stock,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(map_diesel_error))
    }

    async fn release(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<u32>, CartRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<CartRepositoryError>, _>(|conn| {
            async move {
                let released: Option<i32> = diesel::delete(
                    cart_items::table
                        .filter(cart_items::user_id.eq(user_id.get()))
                        .filter(cart_items::product_id.eq(product_id.get())),
                )
                .returning(cart_items::quantity)
                .get_result(conn)
                .await
                .optional()?;
                let Some(released) = released else {
                    return Ok(None);
                };

                // Unlimited products keep a NULL quantity.
                diesel::update(
                    products::table
                        .find(product_id.get())
                        .filter(products::quantity.is_not_null()),
                )
                .set(products::quantity.eq(products::quantity + released))
                .execute(conn)
                .await?;

                Ok(Some(stored_count("cart_items.quantity", released)?))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(map_diesel_error))
    }

    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CartLineRow> = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::user_id.eq(user_id.get()))
            .order(cart_items::product_id.asc())
            .select((
                cart_items::product_id,
                products::name,
                products::price_cents,
                cart_items::quantity,
                products::quantity,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| CartLine::try_from(row).map_err(map_invalid_row))
            .collect()
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, CartRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let removed = diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(u64::try_from(removed).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("too many clients"));

        assert_eq!(err, CartRepositoryError::connection("too many clients"));
    }

    #[rstest]
    fn check_violation_is_a_query_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new("new row violates check constraint".to_string()),
        );

        let err = map_diesel_error(error);

        assert_eq!(err, CartRepositoryError::query("database error"));
    }

    #[rstest]
    fn negative_stored_counts_abort_the_transaction() {
        let err = stored_count("products.quantity", -1).expect_err("negative count");

        let mapped = err.into_repository_error(map_diesel_error);

        assert!(matches!(mapped, CartRepositoryError::Query { .. }));
        assert!(mapped.to_string().contains("products.quantity"));
    }
}
