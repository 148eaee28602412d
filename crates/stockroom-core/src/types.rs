//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌──────────────────────────┐           │
//! │  │      Product        │◄───────│         Order            │           │
//! │  │  ─────────────────  │  ref   │  ──────────────────────  │           │
//! │  │  id (surrogate)     │        │  id (surrogate)          │           │
//! │  │  sku (business)     │        │  order_number (business) │           │
//! │  │  cost_price_cents   │        │  product_sku (snapshot)  │           │
//! │  │  quantity (≥ 0)     │        │  unit_cost_cents (frozen)│           │
//! │  └─────────────────────┘        │  profit_cents (frozen)   │           │
//! │                                 └──────────────────────────┘           │
//! │                                                                         │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐               │
//! │  │   Channel     │  │ PaymentMethod │  │  OrderStatus  │               │
//! │  │  eBay         │  │  cash         │  │  pending      │               │
//! │  │  Facebook     │  │  payid        │  │  done         │               │
//! │  │  saltFish     │  └───────────────┘  └───────────────┘               │
//! │  │  other        │                                                     │
//! │  └───────────────┘                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: integer surrogate assigned by the ledger store
//! - Business key: `sku` / `order_number`, unique and human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Channel
// =============================================================================

/// The sales platform an order originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Channel {
    #[serde(rename = "eBay")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "eBay"))]
    Ebay,
    #[serde(rename = "Facebook")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Facebook"))]
    Facebook,
    /// Second-hand marketplace.
    #[serde(rename = "saltFish")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "saltFish"))]
    SaltFish,
    #[serde(rename = "other")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "other"))]
    Other,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Ebay,
        Channel::Facebook,
        Channel::SaltFish,
        Channel::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Ebay => "eBay",
            Channel::Facebook => "Facebook",
            Channel::SaltFish => "saltFish",
            Channel::Other => "other",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Bank transfer via PayID.
    PayId,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Cash, PaymentMethod::PayId];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::PayId => "payid",
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Sold but not yet handed over / paid out.
    #[default]
    Pending,
    Done,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Done];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Done => "done",
        }
    }
}

// =============================================================================
// Enum parsing (CSV cells, path/query values)
// =============================================================================

macro_rules! impl_enum_text {
    ($ty:ident, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Case-insensitive match against the canonical names.
        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $ty::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    })
            }
        }
    };
}

impl_enum_text!(Channel, "channel");
impl_enum_text!(PaymentMethod, "payment_method");
impl_enum_text!(OrderStatus, "status");

// =============================================================================
// Product
// =============================================================================

/// A stocked product, keyed by SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Surrogate identifier.
    pub id: i64,

    /// Stock Keeping Unit - business identifier, immutable once created.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Current cost price in cents. Orders freeze this at sale time.
    pub cost_price_cents: i64,

    /// On-hand quantity. Never negative.
    pub quantity: i64,

    /// List price suggestion.
    pub preset_price_cents: Option<i64>,

    /// Last observed sale price (informational cache, not authoritative).
    pub actual_price_cents: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// A sale of one product.
///
/// Uses the snapshot pattern: `product_sku`, `product_name`,
/// `unit_cost_cents` and `profit_cents` are frozen when the order's
/// stock-affecting fields are set, so reports stay reproducible after the
/// product is edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub order_number: String,

    /// Live reference to the product; `None` once the product is deleted.
    pub product_id: Option<i64>,
    /// SKU at time of sale (frozen).
    pub product_sku: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Units sold (≥ 1).
    pub quantity: i64,
    /// Sale price per unit.
    pub actual_price_cents: i64,
    /// Product cost per unit when the snapshot was taken.
    pub unit_cost_cents: i64,
    /// `(actual_price − unit_cost) × quantity`, may be negative.
    pub profit_cents: i64,

    pub payment_method: PaymentMethod,
    pub channel: Channel,
    pub status: OrderStatus,
    pub buyer_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<DateTime<Utc>>,
    pub remark: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Transaction date when recorded, creation time otherwise.
    #[inline]
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.transaction_date.unwrap_or(self.created_at)
    }

    #[inline]
    pub fn actual_price(&self) -> Money {
        Money::from_cents(self.actual_price_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// `actual_price × quantity`; `None` on overflow.
    pub fn sales(&self) -> Option<Money> {
        self.actual_price().checked_mul_quantity(self.quantity)
    }

    /// Historical cost, reconstructed from the frozen profit.
    pub fn cost(&self) -> Option<Money> {
        self.sales()?.checked_sub(self.profit())
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Direct product entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub cost_price_cents: i64,
    pub quantity: i64,
    #[serde(default)]
    pub preset_price_cents: Option<i64>,
    #[serde(default)]
    pub actual_price_cents: Option<i64>,
}

/// Partial product edit. The SKU is immutable and therefore absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub preset_price_cents: Option<i64>,
    #[serde(default)]
    pub actual_price_cents: Option<i64>,
}

/// A new order. The order number is generated when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub order_number: Option<String>,
    pub product_sku: String,
    pub quantity: i64,
    pub actual_price_cents: i64,
    pub payment_method: PaymentMethod,
    pub channel: Channel,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remark: Option<String>,
}

/// Partial order edit.
///
/// `product_sku`, `quantity` and `actual_price_cents` are stock/profit
/// affecting; everything else is bookkeeping only.
///
/// `buyer_name`, `transaction_date` and `remark` are clearable: an absent
/// key leaves the value alone, `null` (or blank text) clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub product_sku: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub actual_price_cents: Option<i64>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub buyer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub remark: Option<Option<String>>,
}

/// A present key, `null` included, becomes `Some`.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Unit Tests
// =============================================================================
