//! Driven port for balance debits and purchase records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Money, Multiplier, ProductId, PurchaseRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger repository adapters.
    pub enum LedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "ledger repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ledger repository query failed: {message}",
        /// The user does not exist.
        UserNotFound { user_id: i64 } => "user {user_id} not found",
        /// The cart no longer matches the lines the total was computed from.
        CartChanged => "cart or prices changed during checkout",
    }
}

/// A cart line as seen when the total was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementLine {
    /// Product being bought.
    pub product_id: ProductId,
    /// Units being bought.
    pub quantity: u32,
    /// Unit price the total was computed from.
    pub unit_price: Money,
}

/// Everything needed to settle a checkout atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Buyer.
    pub user_id: UserId,
    /// Expected cart contents, ordered by product id.
    pub lines: Vec<SettlementLine>,
    /// Amount to debit.
    pub total: Money,
    /// Multiplier increase earned from perk products.
    pub multiplier_bonus: u32,
    /// Timestamp stored on every purchase record.
    pub purchased_at: DateTime<Utc>,
}

/// Result of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Debit applied, purchases written, cart cleared.
    Settled {
        /// Balance after the debit.
        balance: Money,
        /// Multiplier after perks.
        multiplier: Multiplier,
    },
    /// The balance could not cover the total; nothing changed.
    InsufficientFunds {
        /// Balance at the time of the check.
        balance: Money,
    },
}

/// Port for the checkout unit of work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// In one transaction: lock the user, verify the cart lines and their
    /// live prices still equal `settlement.lines`, check the balance, debit
    /// it, append one purchase per line, raise the multiplier and clear the
    /// cart. Stock is not touched; it was consumed when the lines were
    /// reserved.
    async fn settle(
        &self,
        settlement: &Settlement,
    ) -> Result<SettlementOutcome, LedgerRepositoryError>;

    /// Current balance, or `None` when the user does not exist.
    async fn balance(&self, user_id: UserId) -> Result<Option<Money>, LedgerRepositoryError>;

    /// Purchase records for the user, newest first.
    async fn history(&self, user_id: UserId) -> Result<Vec<PurchaseRecord>, LedgerRepositoryError>;
}
