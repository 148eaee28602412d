//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Everything that decides *what* the back-office does lives here as pure
//! functions over plain data. Persistence and transport live elsewhere.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   /products  /orders  /orders/import/csv  /reports/comprehensive│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stockroom-db                                 │   │
//! │  │   Ledger store • Stock reconciliation • CSV importer driver     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │validation │ │  csv   │ │ report │  │   │
//! │  │   │ Product │ │  Money  │ │  rules    │ │ rows   │ │ filter │  │   │
//! │  │   │  Order  │ │ profit  │ │           │ │        │ │ stats  │  │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Channel, request structs)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation at the boundary
//! - [`reconcile`] - Stock/profit decisions for order edits
//! - [`csv_import`] - CSV rows → validated product/order drafts
//! - [`report`] - Filter predicate and four-part report aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let cost = Money::parse_decimal("10.00").unwrap();
//! let sale = Money::from_cents(1500);
//!
//! // (15.00 - 10.00) × 2 = 10.00
//! let profit = Money::profit(sale, cost, 2).unwrap();
//! assert_eq!(profit.cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod csv_import;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum SKU length (matches the `products.sku` column).
pub const MAX_SKU_LEN: usize = 64;

/// Maximum order number length (matches the `orders.order_number` column).
pub const MAX_ORDER_NUMBER_LEN: usize = 64;

/// Maximum product / buyer name length.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum remark length.
pub const MAX_REMARK_LEN: usize = 2000;
