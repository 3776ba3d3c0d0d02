//! Driving port for checkout and purchase history.

use async_trait::async_trait;

use crate::domain::{CheckoutOutcome, CheckoutPreview, Error, Money, PurchaseSummary, UserId};

/// Use-case port converting carts into purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutLedger: Send + Sync {
    /// Debit the balance by the server-computed cart total, record the
    /// purchases and clear the cart. `client_total` is advisory only.
    async fn checkout(
        &self,
        user_id: UserId,
        client_total: Option<Money>,
    ) -> Result<CheckoutOutcome, Error>;

    /// Cart, total and balance as they stand right now.
    async fn preview(&self, user_id: UserId) -> Result<CheckoutPreview, Error>;

    /// Purchases aggregated per product, most recent first.
    async fn purchase_history(&self, user_id: UserId) -> Result<Vec<PurchaseSummary>, Error>;
}
