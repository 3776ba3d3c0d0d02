//! Checkout ledger service.
//!
//! The total is always recomputed from live prices. A client-supplied total
//! is compared for diagnostics only. The debit, purchase records, perk
//! application and cart clearing are delegated to
//! [`LedgerRepository::settle`], which commits them together or not at all.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    CartRepository, CartRepositoryError, CheckoutLedger, LedgerRepository, LedgerRepositoryError,
    Settlement, SettlementLine, SettlementOutcome,
};
use crate::domain::{
    CartLine, CheckoutOutcome, CheckoutPreview, CheckoutReceipt, Error, Money, ProductPerk,
    PurchaseRecord, PurchaseSummary, UserId, cart_total, summarise_purchases,
};

fn map_cart_error(error: CartRepositoryError) -> Error {
    match error {
        CartRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("cart repository unavailable: {message}"))
        }
        CartRepositoryError::Query { message } => {
            Error::internal(format!("cart repository error: {message}"))
        }
        other => Error::internal(other.to_string()),
    }
}

fn map_ledger_error(error: LedgerRepositoryError) -> Error {
    match error {
        LedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ledger repository unavailable: {message}"))
        }
        LedgerRepositoryError::Query { message } => {
            Error::internal(format!("ledger repository error: {message}"))
        }
        LedgerRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        LedgerRepositoryError::CartChanged => {
            Error::conflict("cart or prices changed during checkout; review it and try again")
        }
    }
}

fn multiplier_bonus(lines: &[CartLine]) -> u32 {
    lines
        .iter()
        .filter_map(|line| {
            ProductPerk::from_name(&line.name).map(|perk| perk.multiplier_bonus(line.quantity))
        })
        .fold(0, u32::saturating_add)
}

fn settlement_lines(lines: &[CartLine]) -> Result<Vec<SettlementLine>, Error> {
    lines
        .iter()
        .map(|line| {
            let unit_price = line.unit_price.ok_or_else(|| {
                Error::conflict(format!("{} is no longer for sale", line.name))
            })?;
            Ok(SettlementLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            })
        })
        .collect()
}

/// Checkout ledger backed by cart and ledger repositories.
#[derive(Clone)]
pub struct CheckoutService<C, L> {
    carts: Arc<C>,
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<C, L> CheckoutService<C, L> {
    /// Create a checkout service.
    pub fn new(carts: Arc<C>, ledger: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            carts,
            ledger,
            clock,
        }
    }
}

impl<C, L> CheckoutService<C, L>
where
    C: CartRepository,
    L: LedgerRepository,
{
    async fn require_balance(&self, user_id: UserId) -> Result<Money, Error> {
        self.ledger
            .balance(user_id)
            .await
            .map_err(map_ledger_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }
}

#[async_trait]
impl<C, L> CheckoutLedger for CheckoutService<C, L>
where
    C: CartRepository,
    L: LedgerRepository,
{
    async fn checkout(
        &self,
        user_id: UserId,
        client_total: Option<Money>,
    ) -> Result<CheckoutOutcome, Error> {
        self.require_balance(user_id).await?;
        let lines = self.carts.lines(user_id).await.map_err(map_cart_error)?;
        if lines.is_empty() {
            return Err(Error::invalid_request("cart is empty"));
        }
        let total = cart_total(&lines)?;
        if let Some(claimed) = client_total.filter(|claimed| *claimed != total) {
            warn!(%user_id, %claimed, %total, "client total differs from server total");
        }

        let purchased_at = self.clock.utc();
        let settlement = Settlement {
            user_id,
            lines: settlement_lines(&lines)?,
            total,
            multiplier_bonus: multiplier_bonus(&lines),
            purchased_at,
        };

        match self
            .ledger
            .settle(&settlement)
            .await
            .map_err(map_ledger_error)?
        {
            SettlementOutcome::Settled {
                balance,
                multiplier,
            } => {
                info!(%user_id, %total, %balance, lines = lines.len(), "checkout completed");
                Ok(CheckoutOutcome::Completed(CheckoutReceipt {
                    total,
                    balance,
                    multiplier,
                    purchases: lines
                        .into_iter()
                        .map(|line| PurchaseRecord {
                            product_id: line.product_id,
                            product_name: line.name,
                            quantity: line.quantity,
                            purchased_at,
                        })
                        .collect(),
                }))
            }
            SettlementOutcome::InsufficientFunds { balance } => {
                info!(%user_id, %total, %balance, "checkout refused: insufficient funds");
                Ok(CheckoutOutcome::InsufficientFunds { balance, total })
            }
        }
    }

    async fn preview(&self, user_id: UserId) -> Result<CheckoutPreview, Error> {
        let balance = self.require_balance(user_id).await?;
        let lines = self.carts.lines(user_id).await.map_err(map_cart_error)?;
        let total = cart_total(&lines)?;
        Ok(CheckoutPreview {
            lines,
            total,
            balance,
            sufficient_funds: balance >= total,
        })
    }

    async fn purchase_history(&self, user_id: UserId) -> Result<Vec<PurchaseSummary>, Error> {
        let records = self
            .ledger
            .history(user_id)
            .await
            .map_err(map_ledger_error)?;
        Ok(summarise_purchases(&records))
    }
}

#[cfg(test)]
#[path = "checkout_service_tests.rs"]
mod tests;
