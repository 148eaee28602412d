//! # CSV Reconciliation Importer
//!
//! Drives parsed CSV rows through the ledger one at a time.
//!
//! ```text
//! bytes ──► stockroom_core::csv_import ──► drafts ──┬─► ProductRepository::upsert
//!                     │                             └─► OrderRepository::create
//!                     └─► row errors ───────────────────► outcome.errors[]
//! ```
//!
//! Rows run sequentially so a later row sees the stock left by an earlier
//! one. A rejected row never leaves a partial write behind: each applied
//! row is its own transaction.
//!
//! A failure that is not about the row itself (closed pool, I/O) stops the
//! batch. Rows before it stay applied, so the outcome still reports them and
//! names the row the batch stopped at in `aborted_at_row`.

use serde::Serialize;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use crate::repository::order::OrderRepository;
use crate::repository::product::{ProductRepository, UpsertAction};
use stockroom_core::csv_import::{parse_order_csv, parse_product_csv, RowError};

/// A row that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ImportRowError {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub error: String,
    pub message: String,
}

impl ImportRowError {
    fn from_parse(err: RowError) -> Self {
        ImportRowError {
            row: err.row,
            error: "validation_error".to_string(),
            message: err.reason,
        }
    }

    fn from_db(row: usize, err: &DbError) -> Self {
        ImportRowError {
            row,
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ProductImportOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub errors: Vec<ImportRowError>,
    /// Row whose persistence failure stopped the batch; later rows were not tried.
    pub aborted_at_row: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct OrderImportOutcome {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
    /// Row whose persistence failure stopped the batch; later rows were not tried.
    pub aborted_at_row: Option<usize>,
}

/// Errors that belong to one row. Anything else (pool, I/O) aborts the batch.
fn is_row_local(err: &DbError) -> bool {
    matches!(
        err,
        DbError::Domain(_) | DbError::NotFound { .. } | DbError::UniqueViolation { .. } | DbError::Conflict(_)
    )
}

#[derive(Debug, Clone)]
pub struct Importer {
    products: ProductRepository,
    orders: OrderRepository,
}

impl Importer {
    pub fn new(products: ProductRepository, orders: OrderRepository) -> Self {
        Importer { products, orders }
    }

    /// Upserts every valid product row by SKU.
    ///
    /// ## Returns
    /// * `Err(Domain(Validation))` - the header lacks a required column
    /// * `Ok(outcome)` - `inserted + updated` rows applied, the rest in `errors`
    ///   (or untried after `aborted_at_row`)
    pub async fn import_products(&self, csv: &[u8]) -> DbResult<ProductImportOutcome> {
        let parsed = parse_product_csv(csv)?;
        debug!(rows = parsed.rows.len(), rejected = parsed.errors.len(), "Product CSV parsed");

        let mut outcome = ProductImportOutcome {
            errors: parsed.errors.into_iter().map(ImportRowError::from_parse).collect(),
            ..Default::default()
        };

        for (row, draft) in parsed.rows {
            match self.products.upsert(draft).await {
                Ok((_, UpsertAction::Inserted)) => outcome.inserted += 1,
                Ok((_, UpsertAction::Updated)) => outcome.updated += 1,
                Err(e) if is_row_local(&e) => {
                    warn!(row, error = %e, "Product row rejected");
                    outcome.errors.push(ImportRowError::from_db(row, &e));
                }
                Err(e) => {
                    error!(row, error = %e, "Product import stopped");
                    outcome.errors.push(ImportRowError::from_db(row, &e));
                    outcome.aborted_at_row = Some(row);
                    break;
                }
            }
        }

        outcome.errors.sort_by_key(|e| e.row);
        info!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            errors = outcome.errors.len(),
            aborted_at_row = ?outcome.aborted_at_row,
            "Product import finished"
        );
        Ok(outcome)
    }

    /// Creates every valid order row whose order number is new.
    ///
    /// Rows naming an existing order number are skipped without touching
    /// stock. Other rows go through [`OrderRepository::create`], so an
    /// out-of-stock row is rejected whole.
    pub async fn import_orders(&self, csv: &[u8]) -> DbResult<OrderImportOutcome> {
        let parsed = parse_order_csv(csv)?;
        debug!(rows = parsed.rows.len(), rejected = parsed.errors.len(), "Order CSV parsed");

        let mut outcome = OrderImportOutcome {
            errors: parsed.errors.into_iter().map(ImportRowError::from_parse).collect(),
            ..Default::default()
        };

        for (row, draft) in parsed.rows {
            let explicit_number = draft.order_number.clone();

            let existing = match &explicit_number {
                Some(number) => self.orders.find_by_number(number).await.map(|o| o.is_some()),
                None => Ok(false),
            };

            let result = match existing {
                Ok(true) => {
                    debug!(row, order_number = ?explicit_number, "Order exists; row skipped");
                    outcome.skipped += 1;
                    continue;
                }
                Ok(false) => self.orders.create(draft).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(_) => outcome.inserted += 1,
                // Lost a race with another insert of the same number
                Err(e) if explicit_number.is_some() && e.is_unique_violation() => {
                    outcome.skipped += 1;
                }
                Err(e) if is_row_local(&e) => {
                    warn!(row, error = %e, "Order row rejected");
                    outcome.errors.push(ImportRowError::from_db(row, &e));
                }
                Err(e) => {
                    error!(row, error = %e, "Order import stopped");
                    outcome.errors.push(ImportRowError::from_db(row, &e));
                    outcome.aborted_at_row = Some(row);
                    break;
                }
            }
        }

        outcome.errors.sort_by_key(|e| e.row);
        info!(
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            errors = outcome.errors.len(),
            aborted_at_row = ?outcome.aborted_at_row,
            "Order import finished"
        );
        Ok(outcome)
    }
}
