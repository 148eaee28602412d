//! # Stock Reconciliation Planning
//!
//! Pure decisions behind `UpdateOrder`: which product/quantity pair is
//! restored, which is deducted, and whether the profit snapshot is retaken.
//! The ledger store executes the plan inside one transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  patch touches            stock movement              profit snapshot   │
//! │  ─────────────────────    ─────────────────────────   ───────────────── │
//! │  quantity / product_sku   restore(old) + deduct(new)  retaken           │
//! │  actual_price only        none                        retaken           │
//! │  status, buyer, remark,   none                        unchanged         │
//! │  payment, channel, date                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Order, UpdateOrderRequest};

/// The outcome of comparing an order with a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRevision {
    /// SKU the order will reference afterwards.
    pub product_sku: String,
    /// Quantity the order will carry afterwards.
    pub quantity: i64,
    /// Unit sale price afterwards.
    pub actual_price_cents: i64,
    /// Restore the old pair and deduct the new one.
    pub stock_changed: bool,
    /// Retake `unit_cost` and `profit` from the product's current cost.
    pub reprice: bool,
}

impl OrderRevision {
    /// Compares `current` with `patch`.
    ///
    /// An order whose product was deleted (`product_id == None`) that is
    /// pointed at a SKU again counts as a product change: there is nothing
    /// to restore, but the new product must be deducted.
    pub fn plan(current: &Order, patch: &UpdateOrderRequest) -> Self {
        let product_sku = patch
            .product_sku
            .clone()
            .unwrap_or_else(|| current.product_sku.clone());
        let quantity = patch.quantity.unwrap_or(current.quantity);
        let actual_price_cents = patch.actual_price_cents.unwrap_or(current.actual_price_cents);

        let product_changed = match &patch.product_sku {
            Some(sku) => current.product_id.is_none() || *sku != current.product_sku,
            None => false,
        };
        let stock_changed = product_changed || quantity != current.quantity;
        let reprice = stock_changed || actual_price_cents != current.actual_price_cents;

        OrderRevision {
            product_sku,
            quantity,
            actual_price_cents,
            stock_changed,
            reprice,
        }
    }

    /// `(unit_cost, profit)` for this revision at the given unit cost.
    pub fn snapshot(&self, unit_cost: Money) -> CoreResult<(Money, Money)> {
        let profit = Money::profit(
            Money::from_cents(self.actual_price_cents),
            unit_cost,
            self.quantity,
        )?;
        Ok((unit_cost, profit))
    }
}

/// Copies the bookkeeping-only fields of `patch` onto `order`.
pub fn apply_details(order: &mut Order, patch: &UpdateOrderRequest, now: DateTime<Utc>) {
    if let Some(method) = patch.payment_method {
        order.payment_method = method;
    }
    if let Some(channel) = patch.channel {
        order.channel = channel;
    }
    if let Some(status) = patch.status {
        order.status = status;
    }
    if let Some(buyer_name) = &patch.buyer_name {
        order.buyer_name = buyer_name.clone();
    }
    if let Some(transaction_date) = patch.transaction_date {
        order.transaction_date = transaction_date;
    }
    if let Some(remark) = &patch.remark {
        order.remark = remark.clone();
    }
    order.updated_at = now;
}

// =============================================================================
// Unit Tests
// =============================================================================
