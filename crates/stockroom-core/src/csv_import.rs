//! # CSV Import Rows
//!
//! Turns an uploaded CSV document into validated drafts, one per data row.
//! Each row is judged on its own: a bad row becomes a [`RowError`] and the
//! rest of the batch carries on. Applying the drafts to the ledger is the
//! importer's job in `stockroom-db`.
//!
//! ## Formats
//! ```text
//! products: sku,name,cost_price,quantity[,preset_price][,actual_price]
//! orders:   product_sku,actual_price,quantity,payment_method,channel,status
//!           [,order_number][,transaction_date][,buyer_name][,remark]
//! ```
//!
//! Columns may appear in any order; unknown columns are ignored. A header
//! missing a required column rejects the whole document.

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CreateOrderRequest, CreateProductRequest};
use crate::validation::{
    parse_transaction_date, validate_create_order, validate_create_product,
};

pub const PRODUCT_REQUIRED_COLUMNS: [&str; 4] = ["sku", "name", "cost_price", "quantity"];

pub const ORDER_REQUIRED_COLUMNS: [&str; 6] = [
    "product_sku",
    "actual_price",
    "quantity",
    "payment_method",
    "channel",
    "status",
];

// =============================================================================
// Results
// =============================================================================

/// A rejected row. `row` is the 1-based data row number (header excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(row: usize, reason: impl Into<String>) -> Self {
        RowError {
            row,
            reason: reason.into(),
        }
    }
}

/// Parsed document: accepted drafts with their row numbers plus rejects.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRows<T> {
    pub rows: Vec<(usize, T)>,
    pub errors: Vec<RowError>,
}

impl<T> Default for ParsedRows<T> {
    fn default() -> Self {
        ParsedRows {
            rows: Vec::new(),
            errors: Vec::new(),
        }
    }
}

// =============================================================================
// Raw rows
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawProductRow {
    sku: Option<String>,
    name: Option<String>,
    cost_price: Option<String>,
    quantity: Option<String>,
    preset_price: Option<String>,
    actual_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOrderRow {
    order_number: Option<String>,
    product_sku: Option<String>,
    actual_price: Option<String>,
    quantity: Option<String>,
    payment_method: Option<String>,
    channel: Option<String>,
    status: Option<String>,
    transaction_date: Option<String>,
    buyer_name: Option<String>,
    remark: Option<String>,
}

fn cell(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ValidationError> {
    cell(value).ok_or_else(|| ValidationError::required(field))
}

fn integer(value: &str, field: &str) -> Result<i64, ValidationError> {
    value
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid(field, format!("'{value}' is not a whole number")))
}

fn money(value: &str, field: &str) -> Result<i64, ValidationError> {
    Money::parse_decimal_field(value, field).map(|m| m.cents())
}

fn optional_money(value: &Option<String>, field: &str) -> Result<Option<i64>, ValidationError> {
    cell(value).map(|v| money(v, field)).transpose()
}

impl RawProductRow {
    fn into_request(self) -> Result<CreateProductRequest, ValidationError> {
        let draft = CreateProductRequest {
            sku: required(&self.sku, "sku")?.to_string(),
            name: required(&self.name, "name")?.to_string(),
            cost_price_cents: money(required(&self.cost_price, "cost_price")?, "cost_price")?,
            quantity: integer(required(&self.quantity, "quantity")?, "quantity")?,
            preset_price_cents: optional_money(&self.preset_price, "preset_price")?,
            actual_price_cents: optional_money(&self.actual_price, "actual_price")?,
        };
        validate_create_product(&draft)
    }
}

impl RawOrderRow {
    fn into_request(self) -> Result<CreateOrderRequest, ValidationError> {
        let draft = CreateOrderRequest {
            order_number: cell(&self.order_number).map(str::to_string),
            product_sku: required(&self.product_sku, "product_sku")?.to_string(),
            actual_price_cents: money(required(&self.actual_price, "actual_price")?, "actual_price")?,
            quantity: integer(required(&self.quantity, "quantity")?, "quantity")?,
            payment_method: required(&self.payment_method, "payment_method")?.parse()?,
            channel: required(&self.channel, "channel")?.parse()?,
            status: required(&self.status, "status")?.parse()?,
            transaction_date: cell(&self.transaction_date)
                .map(parse_transaction_date)
                .transpose()?,
            buyer_name: cell(&self.buyer_name).map(str::to_string),
            remark: cell(&self.remark).map(str::to_string),
        };
        validate_create_order(&draft)
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn parse<R, T>(
    input: &[u8],
    required_columns: &[&str],
    convert: impl Fn(R) -> Result<T, ValidationError>,
) -> Result<ParsedRows<T>, ValidationError>
where
    R: for<'de> Deserialize<'de>,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| ValidationError::invalid("header", e.to_string()))?
        .clone();

    let missing: Vec<String> = required_columns
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { columns: missing });
    }

    let mut parsed = ParsedRows::default();
    for (index, record) in reader.deserialize::<R>().enumerate() {
        let row = index + 1;
        match record {
            Ok(raw) => match convert(raw) {
                Ok(draft) => parsed.rows.push((row, draft)),
                Err(e) => parsed.errors.push(RowError::new(row, e.to_string())),
            },
            Err(e) => parsed.errors.push(RowError::new(row, format!("unreadable row: {e}"))),
        }
    }

    Ok(parsed)
}

/// Parses a product CSV into upsert drafts.
///
/// ## Example
/// ```rust
/// use stockroom_core::csv_import::parse_product_csv;
///
/// let csv = "sku,name,cost_price,quantity\nSKU-1,Widget,10.00,5\nSKU-2,,1,1\n";
/// let parsed = parse_product_csv(csv.as_bytes()).unwrap();
/// assert_eq!(parsed.rows.len(), 1);
/// assert_eq!(parsed.errors[0].row, 2);
/// ```
pub fn parse_product_csv(input: &[u8]) -> Result<ParsedRows<CreateProductRequest>, ValidationError> {
    parse(input, &PRODUCT_REQUIRED_COLUMNS, RawProductRow::into_request)
}

/// Parses an order CSV into creation drafts.
pub fn parse_order_csv(input: &[u8]) -> Result<ParsedRows<CreateOrderRequest>, ValidationError> {
    parse(input, &ORDER_REQUIRED_COLUMNS, RawOrderRow::into_request)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, OrderStatus, PaymentMethod};

    #[test]
    fn test_product_rows_valid_and_invalid() {
        let csv = "\
sku,name,cost_price,quantity,preset_price,actual_price,warehouse
SKU-1,Widget,10.00,5,,,A1
SKU-2,Gadget,2.5,0,4.99,3.75,B2
SKU-3,Missing cost,,3,,,C3
,No sku,1.00,1,,,D4
SKU-5,Bad qty,1.00,many,,,E5
";
        let parsed = parse_product_csv(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        let (row, first) = &parsed.rows[0];
        assert_eq!(*row, 1);
        assert_eq!(first.sku, "SKU-1");
        assert_eq!(first.cost_price_cents, 1000);
        assert_eq!(first.preset_price_cents, None);

        let (_, second) = &parsed.rows[1];
        assert_eq!(second.preset_price_cents, Some(499));
        assert_eq!(second.actual_price_cents, Some(375));

        let rows: Vec<usize> = parsed.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![3, 4, 5]);
        assert_eq!(parsed.errors[0].reason, "cost_price is required");
        assert_eq!(parsed.errors[1].reason, "sku is required");
    }

    #[test]
    fn test_negative_quantity_is_row_error() {
        let csv = "sku,name,cost_price,quantity\nSKU-1,Widget,1.00,-2\n";
        let parsed = parse_product_csv(csv.as_bytes()).unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.errors[0].reason, "quantity must not be negative");
    }

    #[test]
    fn test_missing_required_column_rejects_document() {
        let csv = "sku,name,quantity\nSKU-1,Widget,5\n";
        let err = parse_product_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns {
                columns: vec!["cost_price".to_string()]
            }
        );
    }

    #[test]
    fn test_column_order_and_short_rows() {
        let csv = "quantity,cost_price,name,sku,preset_price\n4,1.25,Widget,SKU-1\n";
        let parsed = parse_product_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].1.quantity, 4);
        assert_eq!(parsed.rows[0].1.preset_price_cents, None);
    }

    #[test]
    fn test_order_rows() {
        let csv = "\
order_number,product_sku,actual_price,quantity,payment_method,channel,status,transaction_date,buyer_name
A-100,SKU-1,15.00,2,cash,eBay,pending,2025-03-01,Alice
,SKU-1,9.5,1,PAYID,facebook,done,,
A-102,SKU-1,15.00,1,card,eBay,pending,,
A-103,SKU-1,15.00,0,cash,eBay,pending,,
";
        let parsed = parse_order_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);

        let (_, a) = &parsed.rows[0];
        assert_eq!(a.order_number.as_deref(), Some("A-100"));
        assert_eq!(a.channel, Channel::Ebay);
        assert_eq!(a.buyer_name.as_deref(), Some("Alice"));
        assert!(a.transaction_date.is_some());

        let (_, b) = &parsed.rows[1];
        assert_eq!(b.order_number, None);
        assert_eq!(b.payment_method, PaymentMethod::PayId);
        assert_eq!(b.status, OrderStatus::Done);
        assert_eq!(b.actual_price_cents, 950);

        assert_eq!(parsed.errors.len(), 2);
        assert_eq!(parsed.errors[0].row, 3);
        assert!(parsed.errors[0].reason.starts_with("payment_method must be one of"));
        assert_eq!(parsed.errors[1].row, 4);
    }

    #[test]
    fn test_empty_document_has_no_rows() {
        let csv = "sku,name,cost_price,quantity\n";
        let parsed = parse_product_csv(csv.as_bytes()).unwrap();
        assert!(parsed.rows.is_empty());
        assert!(parsed.errors.is_empty());
    }
}
