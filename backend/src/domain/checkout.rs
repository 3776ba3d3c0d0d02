//! Checkout outcomes and purchase history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CartLine, Money, Multiplier, ProductId};

/// Message reported when the balance cannot cover the cart.
pub const INSUFFICIENT_FUNDS_MESSAGE: &str = "Insufficient funds";

/// Receipt of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// Amount debited, recomputed from live prices.
    pub total: Money,
    /// Balance after the debit.
    pub balance: Money,
    /// Earnings multiplier after any perks were applied.
    pub multiplier: Multiplier,
    /// One record per cart line that was converted.
    pub purchases: Vec<PurchaseRecord>,
}

/// Result of a checkout attempt.
///
/// Insufficient funds is an expected outcome, not an error; nothing is
/// changed when it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CheckoutOutcome {
    /// Balance debited, purchases recorded, cart cleared.
    Completed(CheckoutReceipt),
    /// The balance does not cover the total.
    #[serde(rename_all = "camelCase")]
    InsufficientFunds {
        /// Current balance.
        balance: Money,
        /// Amount that would have been debited.
        total: Money,
    },
}

/// Data shown before the user confirms a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreview {
    /// Current cart contents.
    pub lines: Vec<CartLine>,
    /// Server-side total.
    pub total: Money,
    /// Current balance.
    pub balance: Money,
    /// Whether the balance covers the total.
    pub sufficient_funds: bool,
}

/// Append-only record of a bought cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Bought product.
    pub product_id: ProductId,
    /// Product name at read time.
    pub product_name: String,
    /// Units bought.
    pub quantity: u32,
    /// When the checkout committed.
    pub purchased_at: DateTime<Utc>,
}

/// Purchase history aggregated per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    /// Bought product.
    pub product_id: ProductId,
    /// Product name.
    pub product_name: String,
    /// Units bought across all checkouts.
    pub total_quantity: u64,
    /// Most recent purchase of this product.
    pub last_purchased_at: DateTime<Utc>,
}

/// Aggregate purchase records per product, most recently bought first.
pub fn summarise_purchases(records: &[PurchaseRecord]) -> Vec<PurchaseSummary> {
    let mut by_product: BTreeMap<ProductId, PurchaseSummary> = BTreeMap::new();
    for record in records {
        by_product
            .entry(record.product_id)
            .and_modify(|summary| {
                summary.total_quantity += u64::from(record.quantity);
                if record.purchased_at > summary.last_purchased_at {
                    summary.last_purchased_at = record.purchased_at;
                }
            })
            .or_insert_with(|| PurchaseSummary {
                product_id: record.product_id,
                product_name: record.product_name.clone(),
                total_quantity: u64::from(record.quantity),
                last_purchased_at: record.purchased_at,
            });
    }
    let mut summaries: Vec<_> = by_product.into_values().collect();
    summaries.sort_by(|a, b| {
        b.last_purchased_at
            .cmp(&a.last_purchased_at)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    summaries
}
