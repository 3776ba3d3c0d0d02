//! PostgreSQL-backed `LedgerRepository` implementation using Diesel ORM.
//!
//! Settlement runs in one transaction that locks the buyer's row first, then
//! the cart lines, so concurrent checkouts for the same user serialise and a
//! failed step rolls back the debit, purchases and cart clearing together.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, Settlement, SettlementLine, SettlementOutcome,
};
use crate::domain::{Money, ProductId, PurchaseRecord, UserId};

use super::diesel_error_mapping::{
    TxError, map_basic_diesel_error, map_basic_pool_error, map_row_error,
};
use super::models::{self, NewPurchaseRow, PurchaseRow, RowError};
use super::pool::{DbPool, PoolError};
use super::schema::{cart_items, products, purchases, users};

/// Diesel-backed implementation of the `LedgerRepository` port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LedgerRepositoryError {
    map_basic_pool_error(error, LedgerRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LedgerRepositoryError {
    map_basic_diesel_error(
        error,
        LedgerRepositoryError::query,
        LedgerRepositoryError::connection,
    )
}

fn map_invalid_row(error: RowError) -> LedgerRepositoryError {
    map_row_error(error, LedgerRepositoryError::query)
}

fn abort(error: LedgerRepositoryError) -> TxError<LedgerRepositoryError> {
    TxError::Domain(error)
}

/// Rebuild settlement lines from locked cart rows; `None` when any line has
/// lost its price.
fn current_lines(
    rows: Vec<(i64, i32, Option<i64>)>,
) -> Result<Option<Vec<SettlementLine>>, RowError> {
    rows.into_iter()
        .map(|(product_id, quantity, price_cents)| {
            let Some(cents) = price_cents else {
                return Ok(None);
            };
            Ok(Some(SettlementLine {
                product_id: ProductId::new(product_id),
                quantity: models::count("cart_items.quantity", quantity)?,
                unit_price: models::money("price_cents", cents)?,
            }))
        })
        .collect::<Result<Option<Vec<_>>, _>>()
}

fn purchase_rows(settlement: &Settlement) -> Result<Vec<NewPurchaseRow>, LedgerRepositoryError> {
    settlement
        .lines
        .iter()
        .map(|line| {
            Ok(NewPurchaseRow {
                user_id: settlement.user_id.get(),
                product_id: line.product_id.get(),
                quantity: i32::try_from(line.quantity)
                    .map_err(|_| LedgerRepositoryError::query("quantity exceeds storage range"))?,
                purchased_at: settlement.purchased_at,
            })
        })
        .collect()
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn settle(
        &self,
        settlement: &Settlement,
    ) -> Result<SettlementOutcome, LedgerRepositoryError> {
        let rows = purchase_rows(settlement)?;
        let bonus = i32::try_from(settlement.multiplier_bonus)
            .map_err(|_| LedgerRepositoryError::query("multiplier bonus out of range"))?;
        let user_id = settlement.user_id.get();
        let total = settlement.total;
        let expected = &settlement.lines;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<LedgerRepositoryError>, _>(|conn| {
            async move {
                let balance_cents: Option<i64> = users::table
                    .find(user_id)
                    .select(users::balance_cents)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(balance_cents) = balance_cents else {
                    return Err(abort(LedgerRepositoryError::user_not_found(user_id)));
                };

                let cart: Vec<(i64, i32, Option<i64>)> = cart_items::table
                    .inner_join(products::table)
                    .filter(cart_items::user_id.eq(user_id))
                    .order(cart_items::product_id.asc())
                    .select((
                        cart_items::product_id,
                        cart_items::quantity,
                        products::price_cents,
                    ))
                    .for_update()
                    .load(conn)
                    .await?;
                let current = current_lines(cart).map_err(|err| abort(map_invalid_row(err)))?;
                if current.as_ref() != Some(expected) {
                    debug!(user_id, "cart changed between pricing and settlement");
                    return Err(abort(LedgerRepositoryError::cart_changed()));
                }

                let balance = models::money("balance_cents", balance_cents)
                    .map_err(|err| abort(map_invalid_row(err)))?;
                let Some(remaining) = balance.checked_sub(total) else {
                    return Ok(SettlementOutcome::InsufficientFunds { balance });
                };

                let (balance_cents, multiplier): (i64, i32) =
                    diesel::update(users::table.find(user_id))
                        .set((
                            users::balance_cents.eq(remaining.cents()),
                            users::multiplier.eq(users::multiplier + bonus),
                        ))
                        .returning((users::balance_cents, users::multiplier))
                        .get_result(conn)
                        .await?;

                diesel::insert_into(purchases::table)
                    .values(&rows)
                    .execute(conn)
                    .await?;
                diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
                    .execute(conn)
                    .await?;

                Ok(SettlementOutcome::Settled {
                    balance: models::money("balance_cents", balance_cents)
                        .map_err(|err| abort(map_invalid_row(err)))?,
                    multiplier: models::multiplier(multiplier)
                        .map_err(|err| abort(map_invalid_row(err)))?,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(map_diesel_error))
    }

    async fn balance(&self, user_id: UserId) -> Result<Option<Money>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        users::table
            .find(user_id.get())
            .select(users::balance_cents)
            .first::<i64>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(|cents| models::money("balance_cents", cents).map_err(map_invalid_row))
            .transpose()
    }

    async fn history(&self, user_id: UserId) -> Result<Vec<PurchaseRecord>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PurchaseRow> = purchases::table
            .inner_join(products::table)
            .filter(purchases::user_id.eq(user_id.get()))
            .order((purchases::purchased_at.desc(), purchases::id.desc()))
            .select((
                purchases::product_id,
                products::name,
                purchases::quantity,
                purchases::purchased_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| PurchaseRecord::try_from(row).map_err(map_invalid_row))
            .collect()
    }
}
