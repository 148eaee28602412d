//! # stockroom-db: Ledger Store for Stockroom
//!
//! SQLite persistence for products and orders, plus the two engines that
//! write to it: stock reconciliation and CSV import.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /orders)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌────────────────┐  │   │
//! │  │   │   Database    │   │  Repositories  │   │   Importer /   │  │   │
//! │  │   │   (pool.rs)   │◄──│ ProductRepo    │◄──│   Reports      │  │   │
//! │  │   │  SqlitePool   │   │ OrderRepo      │   │                │  │   │
//! │  │   └───────────────┘   └────────────────┘   └────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) ── migrations/sqlite/*.sql embedded at build time         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and order repositories
//! - [`import`] - CSV import driver
//! - [`report`] - Report loading
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./stockroom.db")).await?;
//! let order = db.orders().create(request).await?;
//! let outcome = db.importer().import_products(csv_bytes).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod import;
pub mod migrations;
pub mod pool;
pub mod report;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use import::{Importer, ImportRowError, OrderImportOutcome, ProductImportOutcome};
pub use pool::{Database, DbConfig};
pub use report::ReportRepository;

pub use repository::order::{
    generate_order_number, BulkDeleteFailure, BulkDeleteMode, BulkDeleteOutcome, BulkProgress,
    OrderRepository,
};
pub use repository::product::{ProductRepository, UpsertAction};
