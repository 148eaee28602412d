//! # Validation Module
//!
//! Boundary validation for every request that reaches the ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Shape and types of JSON bodies / CSV cells                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, ranges, character sets                  │
//! │  └── Normalization (trimming, empty optional text → None)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(sku), UNIQUE(order_number)                                 │
//! │  └── CHECK(quantity >= 0)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invalid shapes become [`ValidationError`]; nothing is silently coerced.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::ValidationError;
use crate::types::{
    CreateOrderRequest, CreateProductRequest, UpdateOrderRequest, UpdateProductRequest,
};
use crate::{MAX_NAME_LEN, MAX_ORDER_NUMBER_LEN, MAX_REMARK_LEN, MAX_SKU_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn identifier(value: &str, field: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ValidationError::invalid(
            field,
            "must contain only letters, numbers, hyphens, underscores and dots",
        ));
    }

    Ok(value.to_string())
}

/// Validates a SKU and returns it trimmed.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert_eq!(validate_sku(" SKU-1 ").unwrap(), "SKU-1");
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<String> {
    identifier(sku, "sku", MAX_SKU_LEN)
}

/// Validates an order number and returns it trimmed.
pub fn validate_order_number(order_number: &str) -> ValidationResult<String> {
    identifier(order_number, "order_number", MAX_ORDER_NUMBER_LEN)
}

/// Validates a product name and returns it trimmed.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Trims optional free text; blank becomes `None`.
pub fn normalize_optional_text(
    value: Option<&str>,
    field: &str,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity sold on an order: must be at least 1.
pub fn validate_order_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::from(i32::MAX),
        });
    }

    Ok(())
}

/// On-hand stock quantity: must not be negative.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a non-negative amount in cents.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("cost_price", 1099).is_ok());
/// assert!(validate_price_cents("cost_price", 0).is_ok());
/// assert!(validate_price_cents("cost_price", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

fn validate_optional_price(field: &str, cents: Option<i64>) -> ValidationResult<()> {
    match cents {
        Some(c) => validate_price_cents(field, c),
        None => Ok(()),
    }
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Parses a transaction date.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and bare
/// `YYYY-MM-DD` (midnight). Values without an offset are taken as UTC.
pub fn parse_transaction_date(input: &str) -> ValidationResult<DateTime<Utc>> {
    let text = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(ValidationError::invalid(
        "transaction_date",
        format!("'{text}' is not a recognised date"),
    ))
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates and normalizes a product creation request.
pub fn validate_create_product(req: &CreateProductRequest) -> ValidationResult<CreateProductRequest> {
    let sku = validate_sku(&req.sku)?;
    let name = validate_product_name(&req.name)?;
    validate_price_cents("cost_price", req.cost_price_cents)?;
    validate_stock_quantity(req.quantity)?;
    validate_optional_price("preset_price", req.preset_price_cents)?;
    validate_optional_price("actual_price", req.actual_price_cents)?;

    Ok(CreateProductRequest {
        sku,
        name,
        ..req.clone()
    })
}

/// Validates and normalizes a partial product edit.
pub fn validate_update_product(req: &UpdateProductRequest) -> ValidationResult<UpdateProductRequest> {
    let name = req.name.as_deref().map(validate_product_name).transpose()?;
    validate_optional_price("cost_price", req.cost_price_cents)?;
    if let Some(q) = req.quantity {
        validate_stock_quantity(q)?;
    }
    validate_optional_price("preset_price", req.preset_price_cents)?;
    validate_optional_price("actual_price", req.actual_price_cents)?;

    Ok(UpdateProductRequest {
        name,
        ..req.clone()
    })
}

/// Validates and normalizes an order creation request.
pub fn validate_create_order(req: &CreateOrderRequest) -> ValidationResult<CreateOrderRequest> {
    let order_number = match req.order_number.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(n) => Some(validate_order_number(n)?),
    };
    let product_sku = validate_sku(&req.product_sku)?;
    validate_order_quantity(req.quantity)?;
    validate_price_cents("actual_price", req.actual_price_cents)?;

    Ok(CreateOrderRequest {
        order_number,
        product_sku,
        buyer_name: normalize_optional_text(req.buyer_name.as_deref(), "buyer_name", MAX_NAME_LEN)?,
        remark: normalize_optional_text(req.remark.as_deref(), "remark", MAX_REMARK_LEN)?,
        ..req.clone()
    })
}

/// Validates and normalizes a partial order edit.
pub fn validate_update_order(req: &UpdateOrderRequest) -> ValidationResult<UpdateOrderRequest> {
    let product_sku = req.product_sku.as_deref().map(validate_sku).transpose()?;
    if let Some(q) = req.quantity {
        validate_order_quantity(q)?;
    }
    validate_optional_price("actual_price", req.actual_price_cents)?;

    // Blank text clears the field, same as null
    let clearable = |value: &Option<Option<String>>, field: &str, max: usize| {
        value
            .as_ref()
            .map(|v| normalize_optional_text(v.as_deref(), field, max))
            .transpose()
    };

    Ok(UpdateOrderRequest {
        product_sku,
        buyer_name: clearable(&req.buyer_name, "buyer_name", MAX_NAME_LEN)?,
        remark: clearable(&req.remark, "remark", MAX_REMARK_LEN)?,
        ..req.clone()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, OrderStatus, PaymentMethod};

    fn order_request() -> CreateOrderRequest {
        CreateOrderRequest {
            order_number: None,
            product_sku: "SKU-1".to_string(),
            quantity: 1,
            actual_price_cents: 1500,
            payment_method: PaymentMethod::Cash,
            channel: Channel::Ebay,
            status: OrderStatus::Pending,
            buyer_name: None,
            transaction_date: None,
            remark: None,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert_eq!(validate_sku("SKU-1").unwrap(), "SKU-1");
        assert!(validate_sku("product_1.v2").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Widget ").unwrap(), "Widget");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_quantities() {
        assert!(validate_order_quantity(1).is_ok());
        assert!(validate_order_quantity(0).is_err());
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_update_order_blank_text_clears() {
        let req = UpdateOrderRequest {
            buyer_name: Some(Some("   ".to_string())),
            remark: Some(Some(" note ".to_string())),
            ..Default::default()
        };
        let v = validate_update_order(&req).unwrap();
        assert_eq!(v.buyer_name, Some(None));
        assert_eq!(v.remark, Some(Some("note".to_string())));
        assert_eq!(v.transaction_date, None);
    }

    #[test]
    fn test_parse_transaction_date() {
        let a = parse_transaction_date("2025-03-01T10:30:00Z").unwrap();
        let b = parse_transaction_date("2025-03-01 10:30:00").unwrap();
        let c = parse_transaction_date("2025-03-01T12:30:00+02:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);

        let d = parse_transaction_date("2025-03-01").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-03-01T00:00:00+00:00");

        assert!(parse_transaction_date("01/03/2025").is_err());
    }

    #[test]
    fn test_validate_create_order_normalizes() {
        let mut req = order_request();
        req.order_number = Some("  ".to_string());
        req.buyer_name = Some("  Alice ".to_string());
        req.remark = Some("".to_string());

        let v = validate_create_order(&req).unwrap();
        assert_eq!(v.order_number, None);
        assert_eq!(v.buyer_name.as_deref(), Some("Alice"));
        assert_eq!(v.remark, None);

        req.quantity = 0;
        assert!(validate_create_order(&req).is_err());
    }

    #[test]
    fn test_validate_create_product_rejects_negative_money() {
        let req = CreateProductRequest {
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            cost_price_cents: -1,
            quantity: 5,
            preset_price_cents: None,
            actual_price_cents: None,
        };
        let err = validate_create_product(&req).unwrap_err();
        assert_eq!(err.to_string(), "cost_price must not be negative");
    }
}
