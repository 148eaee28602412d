//! # Report Loading
//!
//! Reads orders for the report engine in `stockroom-core`. A single SELECT
//! runs against one WAL snapshot, so the report is consistent without ever
//! taking the write lock that stock mutations use.
//!
//! The whole filter runs in SQL. The effective date is
//! `COALESCE(transaction_date, created_at)`; timestamps are stored as UTC
//! RFC 3339 text, so its first ten characters are the UTC calendar day.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::report::{build_report, Report, ReportFilter};
use stockroom_core::Order;

const EFFECTIVE_DAY: &str = "substr(COALESCE(transaction_date, created_at), 1, 10)";

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Orders accepted by the filter, oldest first.
    async fn load(&self, filter: &ReportFilter) -> DbResult<Vec<Order>> {
        let mut query = select_orders(filter);
        let orders = query
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Builds the four-part report for `filter`.
    pub async fn generate(&self, filter: &ReportFilter) -> DbResult<Report> {
        filter.validate()?;

        let orders = self.load(filter).await?;
        debug!(orders = orders.len(), "Generating report");

        Ok(build_report(filter, &orders)?)
    }
}

fn select_orders(filter: &ReportFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM orders WHERE 1 = 1");

    if let Some(start) = filter.start_date {
        query
            .push(format!(" AND {EFFECTIVE_DAY} >= "))
            .push_bind(start.format("%Y-%m-%d").to_string());
    }
    if let Some(end) = filter.end_date {
        query
            .push(format!(" AND {EFFECTIVE_DAY} <= "))
            .push_bind(end.format("%Y-%m-%d").to_string());
    }

    push_in(&mut query, "channel", filter.channels.iter().map(|c| c.as_str()));
    push_in(
        &mut query,
        "payment_method",
        filter.payment_methods.iter().map(|m| m.as_str()),
    );
    push_in(&mut query, "status", filter.statuses.iter().map(|s| s.as_str()));
    push_in(
        &mut query,
        "product_sku",
        filter.product_skus.iter().map(String::as_str),
    );

    query.push(" ORDER BY id");
    query
}

/// Appends `AND column IN (...)`; an empty set adds nothing.
fn push_in<'v>(
    query: &mut QueryBuilder<'static, Sqlite>,
    column: &str,
    values: impl ExactSizeIterator<Item = &'v str>,
) {
    if values.len() == 0 {
        return;
    }

    query.push(format!(" AND {column} IN ("));
    let mut list = query.separated(", ");
    for value in values {
        list.push_bind(value.to_string());
    }
    list.push_unseparated(")");
}
