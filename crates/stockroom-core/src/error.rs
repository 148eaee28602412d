//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed / missing input                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Persistence failures (+ wrapped CoreError)     │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant leaves ledger state unchanged: operations that produce one
/// of these roll back before returning it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown SKU, order id or order number.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// SKU or order number collision where uniqueness is required.
    #[error("Duplicate {field}: '{value}' already exists")]
    DuplicateKey { field: String, value: String },

    /// Insufficient product quantity for the requested deduction.
    ///
    /// ## User Workflow
    /// ```text
    /// CreateOrder(sku=SKU-1, quantity=4)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// OutOfStock { sku: "SKU-1", available: 3, requested: 4 }
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    OutOfStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Concurrent modification detected at the product row.
    #[error("Conflicting update: {0}")]
    ConflictingUpdate(String),

    /// Monetary arithmetic left the representable range.
    #[error("Amount overflow while computing {0}")]
    Overflow(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and key.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Creates a DuplicateKey error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::DuplicateKey {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Machine-readable kind used in API envelopes and import reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_error",
            CoreError::NotFound { .. } => "not_found",
            CoreError::DuplicateKey { .. } => "duplicate_key",
            CoreError::OutOfStock { .. } => "out_of_stock",
            CoreError::ConflictingUpdate(_) => "conflicting_update",
            CoreError::Overflow(_) => "validation_error",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (bad number, date, characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A CSV header lacks a required column.
    #[error("missing required column(s): {columns:?}")]
    MissingColumns { columns: Vec<String> },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
