//! Shared fixtures for the ledger integration tests.

#![allow(dead_code)]

use stockroom_core::{Channel, CreateOrderRequest, CreateProductRequest, OrderStatus, PaymentMethod};
use stockroom_db::{Database, DbConfig};

pub async fn database() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub fn product(sku: &str, cost_cents: i64, quantity: i64) -> CreateProductRequest {
    CreateProductRequest {
        sku: sku.to_string(),
        name: format!("{sku} product"),
        cost_price_cents: cost_cents,
        quantity,
        preset_price_cents: None,
        actual_price_cents: None,
    }
}

pub fn order(sku: &str, quantity: i64, price_cents: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        order_number: None,
        product_sku: sku.to_string(),
        quantity,
        actual_price_cents: price_cents,
        payment_method: PaymentMethod::Cash,
        channel: Channel::Ebay,
        status: OrderStatus::Pending,
        buyer_name: None,
        transaction_date: None,
        remark: None,
    }
}

pub async fn stock(db: &Database, sku: &str) -> i64 {
    db.products().quantity(sku).await.expect("product exists")
}
