//! # Order Repository: Stock Reconciliation Engine
//!
//! Every order mutation and its stock adjustment commit or roll back
//! together in one SQLite transaction.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Each transaction opens with a write statement, so it takes SQLite's    │
//! │  write lock before it reads anything:                                   │
//! │                                                                         │
//! │  create  UPDATE products SET quantity = quantity - n                    │
//! │            WHERE sku = ? AND quantity >= n        ← check + deduct      │
//! │          INSERT INTO orders ...                                         │
//! │                                                                         │
//! │  update  UPDATE orders SET updated_at = ? ... RETURNING *               │
//! │          restore(old) → deduct(new) → UPDATE orders                     │
//! │                                                                         │
//! │  delete  DELETE FROM orders ... RETURNING *                             │
//! │          UPDATE products SET quantity = quantity + n                    │
//! │                                                                         │
//! │  Concurrent writers wait on busy_timeout; WAL readers never wait.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use stockroom_core::reconcile::{apply_details, OrderRevision};
use stockroom_core::validation::{validate_create_order, validate_update_order};
use stockroom_core::{CoreError, CreateOrderRequest, Money, Order, UpdateOrderRequest};

// =============================================================================
// Order numbers
// =============================================================================

/// Last issued slot: `millis * SLOTS_PER_MILLI + sequence`.
static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

const SLOTS_PER_MILLI: u64 = 10_000;

/// Generates an order number in format: `ORD-YYYYMMDDHHMMSSmmm-NNNN`
///
/// - `YYYYMMDDHHMMSSmmm`: creation time (UTC, milliseconds)
/// - `NNNN`: sequence within that millisecond
///
/// Numbers issued by one process strictly increase. More than 10 000 orders
/// in one millisecond, or a clock stepping backwards, borrow the following
/// milliseconds instead of wrapping. The unique index catches the (unlikely)
/// collision across processes.
///
/// ## Example
/// `ORD-20250301101500123-0042`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let previous = ORDER_SEQUENCE
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
            Some(next_slot(prev, now))
        })
        .unwrap_or_else(|prev| prev);
    format_slot(next_slot(previous, now), now)
}

fn next_slot(previous: u64, now: DateTime<Utc>) -> u64 {
    let floor = u64::try_from(now.timestamp_millis())
        .unwrap_or(0)
        .saturating_mul(SLOTS_PER_MILLI);
    previous.saturating_add(1).max(floor)
}

fn format_slot(slot: u64, now: DateTime<Utc>) -> String {
    let stamp = i64::try_from(slot / SLOTS_PER_MILLI)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(now);
    format!(
        "ORD-{}-{:04}",
        stamp.format("%Y%m%d%H%M%S%3f"),
        slot % SLOTS_PER_MILLI
    )
}

// =============================================================================
// Bulk delete types
// =============================================================================

/// What bulk delete does after a failed id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BulkDeleteMode {
    /// Stop at the first failure. Ids already processed stay deleted.
    #[default]
    AbortOnError,
    /// Record the failure and carry on with the next id.
    ContinueOnError,
}

/// Reported after every successful deletion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BulkProgress {
    pub completed: usize,
    pub total: usize,
    /// `completed / total`, in `0.0..=1.0`
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct BulkDeleteFailure {
    pub id: i64,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct BulkDeleteOutcome {
    pub requested: usize,
    pub deleted: usize,
    pub failures: Vec<BulkDeleteFailure>,
    /// True when a failure stopped the batch before every id was tried.
    pub aborted: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Product columns the engine needs after a successful deduction.
#[derive(Debug, sqlx::FromRow)]
struct StockedProduct {
    id: i64,
    name: String,
    cost_price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Checks and deducts stock in one statement.
    ///
    /// `sold_at_cents` also refreshes the product's last-observed sale price.
    async fn deduct(
        conn: &mut SqliteConnection,
        sku: &str,
        quantity: i64,
        sold_at_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> DbResult<StockedProduct> {
        let stocked = sqlx::query_as::<_, StockedProduct>(
            r#"
            UPDATE products SET
                quantity = quantity - ?2,
                actual_price_cents = COALESCE(?3, actual_price_cents),
                updated_at = ?4
            WHERE sku = ?1 AND quantity >= ?2
            RETURNING id, name, cost_price_cents
            "#,
        )
        .bind(sku)
        .bind(quantity)
        .bind(sold_at_cents)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(stocked) = stocked {
            debug!(sku = %sku, quantity, "Stock deducted");
            return Ok(stocked);
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&mut *conn)
            .await?;

        Err(match available {
            None => CoreError::not_found("Product", sku).into(),
            Some(available) => CoreError::OutOfStock {
                sku: sku.to_string(),
                available,
                requested: quantity,
            }
            .into(),
        })
    }

    /// Puts `quantity` back on the product. False when the product is gone.
    async fn restore(
        conn: &mut SqliteConnection,
        product_id: i64,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let restored = sqlx::query(
            "UPDATE products SET quantity = quantity + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .rows_affected()
            == 1;

        debug!(product_id, quantity, restored, "Stock restored");
        Ok(restored)
    }

    /// Creates an order and deducts its stock.
    ///
    /// ## Returns
    /// * `Ok(Order)` - Stored order with id, order number and profit snapshot
    /// * `Err(OutOfStock)` - Product has fewer units than requested; nothing changed
    /// * `Err(NotFound)` - Unknown SKU
    /// * `Err(UniqueViolation)` - Order number already taken
    pub async fn create(&self, request: CreateOrderRequest) -> DbResult<Order> {
        let request = validate_create_order(&request)?;
        let now = Utc::now();
        let order_number = request
            .order_number
            .clone()
            .unwrap_or_else(|| generate_order_number(now));

        debug!(
            order_number = %order_number,
            sku = %request.product_sku,
            quantity = request.quantity,
            "Creating order"
        );

        let mut tx = self.pool.begin().await?;

        let product = Self::deduct(
            &mut *tx,
            &request.product_sku,
            request.quantity,
            Some(request.actual_price_cents),
            now,
        )
        .await?;

        let unit_cost = Money::from_cents(product.cost_price_cents);
        let profit = Money::profit(
            Money::from_cents(request.actual_price_cents),
            unit_cost,
            request.quantity,
        )?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                order_number, product_id, product_sku, product_name,
                quantity, actual_price_cents, unit_cost_cents, profit_cents,
                payment_method, channel, status, buyer_name, transaction_date, remark,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
            RETURNING *
            "#,
        )
        .bind(&order_number)
        .bind(product.id)
        .bind(&request.product_sku)
        .bind(&product.name)
        .bind(request.quantity)
        .bind(request.actual_price_cents)
        .bind(unit_cost.cents())
        .bind(profit.cents())
        .bind(request.payment_method)
        .bind(request.channel)
        .bind(request.status)
        .bind(&request.buyer_name)
        .bind(request.transaction_date)
        .bind(&request.remark)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value("order_number", &order_number))?;

        tx.commit().await?;

        info!(
            order_id = order.id,
            order_number = %order.order_number,
            sku = %order.product_sku,
            quantity = order.quantity,
            profit = %order.profit(),
            "Order created"
        );
        Ok(order)
    }

    /// Applies a partial edit.
    ///
    /// A product or quantity change restores the old pair and deducts the
    /// new one; a price change retakes the profit snapshot at the product's
    /// current cost. Anything else is bookkeeping only. On `OutOfStock`
    /// nothing is persisted, including the restore.
    pub async fn update(&self, id: i64, patch: UpdateOrderRequest) -> DbResult<Order> {
        let patch = validate_update_order(&patch)?;
        let now = Utc::now();

        debug!(order_id = id, "Updating order");

        let mut tx = self.pool.begin().await?;

        // Touching the row first takes the write lock before anything is read.
        let mut order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET updated_at = ?2 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id.to_string()))?;

        let revision = OrderRevision::plan(&order, &patch);

        if revision.stock_changed {
            match order.product_id {
                Some(product_id) => {
                    Self::restore(&mut *tx, product_id, order.quantity, now).await?;
                }
                None => warn!(
                    order_id = id,
                    sku = %order.product_sku,
                    quantity = order.quantity,
                    "Product was deleted; old quantity not restored"
                ),
            }

            let product =
                Self::deduct(&mut *tx, &revision.product_sku, revision.quantity, None, now).await?;
            let (unit_cost, profit) =
                revision.snapshot(Money::from_cents(product.cost_price_cents))?;

            order.product_id = Some(product.id);
            order.product_sku = revision.product_sku.clone();
            order.product_name = product.name;
            order.unit_cost_cents = unit_cost.cents();
            order.profit_cents = profit.cents();
        } else if revision.reprice {
            let current_cost: Option<i64> = match order.product_id {
                Some(product_id) => {
                    sqlx::query_scalar("SELECT cost_price_cents FROM products WHERE id = ?1")
                        .bind(product_id)
                        .fetch_optional(&mut *tx)
                        .await?
                }
                None => None,
            };
            let unit_cost = Money::from_cents(current_cost.unwrap_or(order.unit_cost_cents));
            let (unit_cost, profit) = revision.snapshot(unit_cost)?;

            order.unit_cost_cents = unit_cost.cents();
            order.profit_cents = profit.cents();
        }

        order.quantity = revision.quantity;
        order.actual_price_cents = revision.actual_price_cents;
        apply_details(&mut order, &patch, now);

        sqlx::query(
            r#"
            UPDATE orders SET
                product_id = ?2,
                product_sku = ?3,
                product_name = ?4,
                quantity = ?5,
                actual_price_cents = ?6,
                unit_cost_cents = ?7,
                profit_cents = ?8,
                payment_method = ?9,
                channel = ?10,
                status = ?11,
                buyer_name = ?12,
                transaction_date = ?13,
                remark = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(order.id)
        .bind(order.product_id)
        .bind(&order.product_sku)
        .bind(&order.product_name)
        .bind(order.quantity)
        .bind(order.actual_price_cents)
        .bind(order.unit_cost_cents)
        .bind(order.profit_cents)
        .bind(order.payment_method)
        .bind(order.channel)
        .bind(order.status)
        .bind(&order.buyer_name)
        .bind(order.transaction_date)
        .bind(&order.remark)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id = id,
            stock_changed = revision.stock_changed,
            repriced = revision.reprice,
            "Order updated"
        );
        Ok(order)
    }

    /// Deletes an order and restores its stock.
    ///
    /// When the product has since been deleted only the order is removed.
    pub async fn delete(&self, id: i64) -> DbResult<Order> {
        debug!(order_id = id, "Deleting order");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("DELETE FROM orders WHERE id = ?1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id.to_string()))?;

        let restored = match order.product_id {
            Some(product_id) => Self::restore(&mut *tx, product_id, order.quantity, now).await?,
            None => false,
        };

        tx.commit().await?;

        if restored {
            info!(order_id = id, sku = %order.product_sku, quantity = order.quantity, "Order deleted");
        } else {
            warn!(
                order_id = id,
                sku = %order.product_sku,
                quantity = order.quantity,
                "Order deleted without stock restore; product no longer exists"
            );
        }
        Ok(order)
    }

    /// Deletes `ids` one at a time in the given order.
    ///
    /// `progress` is called after every successful deletion, so its values
    /// never decrease and reach 1.0 when every id succeeds.
    pub async fn bulk_delete<F>(
        &self,
        ids: &[i64],
        mode: BulkDeleteMode,
        mut progress: F,
    ) -> BulkDeleteOutcome
    where
        F: FnMut(BulkProgress),
    {
        let total = ids.len();
        let mut outcome = BulkDeleteOutcome {
            requested: total,
            ..Default::default()
        };

        for (index, &id) in ids.iter().enumerate() {
            match self.delete(id).await {
                Ok(_) => {
                    outcome.deleted += 1;
                    progress(BulkProgress {
                        completed: outcome.deleted,
                        total,
                        fraction: outcome.deleted as f64 / total as f64,
                    });
                }
                Err(e) => {
                    warn!(order_id = id, error = %e, "Bulk delete item failed");
                    outcome.failures.push(BulkDeleteFailure {
                        id,
                        error: e.kind().to_string(),
                        message: e.to_string(),
                    });
                    if mode == BulkDeleteMode::AbortOnError {
                        outcome.aborted = index + 1 < total;
                        break;
                    }
                }
            }
        }

        info!(
            requested = outcome.requested,
            deleted = outcome.deleted,
            failed = outcome.failures.len(),
            aborted = outcome.aborted,
            "Bulk delete finished"
        );
        outcome
    }

    pub async fn get(&self, id: i64) -> DbResult<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id.to_string()))
    }

    pub async fn find_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = ?1")
            .bind(order_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Order> {
        self.find_by_number(order_number)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_number))
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_number_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
        let first = next_slot(0, at);

        assert_eq!(format_slot(first, at), "ORD-20250301101500000-0000");
        assert_eq!(format_slot(next_slot(first, at), at), "ORD-20250301101500000-0001");
    }

    #[test]
    fn test_order_numbers_stay_sorted_past_sequence_limit() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
        let last_in_milli = next_slot(0, at) + SLOTS_PER_MILLI - 1;
        let overflow = next_slot(last_in_milli, at);

        let a = format_slot(last_in_milli, at);
        let b = format_slot(overflow, at);
        assert_eq!(a, "ORD-20250301101500000-9999");
        assert_eq!(b, "ORD-20250301101500001-0000");
        assert!(a < b);

        // A clock stepping back does not reuse numbers
        let earlier = at - chrono::Duration::seconds(5);
        assert!(format_slot(next_slot(overflow, earlier), earlier) > b);
    }

    #[test]
    fn test_order_numbers_increase_within_process() {
        let at = Utc::now();
        let numbers: Vec<String> = (0..50).map(|_| generate_order_number(at)).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_default_bulk_mode_aborts() {
        assert_eq!(BulkDeleteMode::default(), BulkDeleteMode::AbortOnError);
    }
}
