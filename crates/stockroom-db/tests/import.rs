//! CSV reconciliation importer against a live ledger.

mod common;

use common::{database, order, product, stock};
use stockroom_core::{Channel, OrderStatus, PaymentMethod, ValidationError};
use stockroom_db::DbError;

#[tokio::test]
async fn test_product_import_counts_and_row_errors() {
    let db = database().await;
    db.products().create(product("SKU-1", 500, 2)).await.unwrap();

    let csv = "\
sku,name,cost_price,quantity,preset_price,actual_price
SKU-1,Widget,10.00,5,,
SKU-2,Gadget,2.50,8,4.99,
SKU-3,,1.00,1,,
SKU-4,Gizmo,abc,1,,
SKU-5,Doohickey,1.00,3,,2.00
";
    let outcome = db.importer().import_products(csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.aborted_at_row, None);
    let rows: Vec<usize> = outcome.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![3, 4]);
    assert!(outcome.errors.iter().all(|e| e.error == "validation_error"));

    let updated = db.products().get("SKU-1").await.unwrap();
    assert_eq!(updated.name, "Widget");
    assert_eq!(updated.cost_price_cents, 1000);
    assert_eq!(updated.quantity, 5);

    // No partial record from invalid rows
    assert!(db.products().find_by_sku("SKU-3").await.unwrap().is_none());
    assert!(db.products().find_by_sku("SKU-4").await.unwrap().is_none());
    assert_eq!(db.products().count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_product_import_missing_column_imports_nothing() {
    let db = database().await;
    let csv = "sku,name,quantity\nSKU-1,Widget,5\n";

    let err = db.importer().import_products(csv.as_bytes()).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(stockroom_core::CoreError::Validation(
            ValidationError::MissingColumns { .. }
        ))
    ));
    assert_eq!(db.products().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_order_import_skips_existing_numbers() {
    let db = database().await;
    db.products().create(product("SKU-1", 1000, 10)).await.unwrap();

    let mut existing = order("SKU-1", 2, 1500);
    existing.order_number = Some("A-1".to_string());
    db.orders().create(existing).await.unwrap();
    assert_eq!(stock(&db, "SKU-1").await, 8);

    let csv = "\
order_number,product_sku,actual_price,quantity,payment_method,channel,status,buyer_name
A-1,SKU-1,15.00,5,cash,eBay,pending,
A-2,SKU-1,12.00,3,payid,Facebook,done,Bob
";
    let outcome = db.importer().import_orders(csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.inserted, 1);
    assert!(outcome.errors.is_empty());
    // Only A-2's three units left the shelf
    assert_eq!(stock(&db, "SKU-1").await, 5);
    assert_eq!(db.orders().get_by_number("A-1").await.unwrap().quantity, 2);

    let imported = db.orders().get_by_number("A-2").await.unwrap();
    assert_eq!(imported.channel, Channel::Facebook);
    assert_eq!(imported.payment_method, PaymentMethod::PayId);
    assert_eq!(imported.status, OrderStatus::Done);
    assert_eq!(imported.buyer_name.as_deref(), Some("Bob"));
    assert_eq!(imported.profit_cents, (1200 - 1000) * 3);
}

#[tokio::test]
async fn test_order_import_rows_are_independent() {
    let db = database().await;
    db.products().create(product("SKU-1", 1000, 4)).await.unwrap();

    let csv = "\
product_sku,actual_price,quantity,payment_method,channel,status,transaction_date
SKU-1,15.00,3,cash,eBay,pending,2025-03-01
SKU-1,15.00,3,cash,eBay,pending,2025-03-02
NOPE,15.00,1,cash,eBay,pending,
SKU-1,15.00,1,bitcoin,eBay,pending,
SKU-1,15.00,1,cash,other,done,2025-03-03 10:30:00
";
    let outcome = db.importer().import_orders(csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.skipped, 0);
    let errors: Vec<(usize, &str)> = outcome
        .errors
        .iter()
        .map(|e| (e.row, e.error.as_str()))
        .collect();
    assert_eq!(
        errors,
        vec![(2, "out_of_stock"), (3, "not_found"), (4, "validation_error")]
    );

    // Row 2 left no partial deduction behind
    assert_eq!(stock(&db, "SKU-1").await, 0);
    assert_eq!(db.orders().list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_order_import_generates_numbers() {
    let db = database().await;
    db.products().create(product("SKU-1", 100, 10)).await.unwrap();

    let csv = "\
product_sku,actual_price,quantity,payment_method,channel,status
SKU-1,2.00,1,cash,eBay,pending
SKU-1,2.00,1,cash,eBay,pending
";
    let outcome = db.importer().import_orders(csv.as_bytes()).await.unwrap();
    assert_eq!(outcome.inserted, 2);

    let orders = db.orders().list().await.unwrap();
    assert_ne!(orders[0].order_number, orders[1].order_number);
    assert!(orders.iter().all(|o| o.order_number.starts_with("ORD-")));
}

/// Makes inserts matching `condition` fail the way a dying disk would.
async fn fail_inserts(db: &stockroom_db::Database, table: &str, condition: &str) {
    let trigger = format!(
        "CREATE TRIGGER fail_{table} BEFORE INSERT ON {table} WHEN {condition} \
         BEGIN SELECT RAISE(ABORT, 'disk unavailable'); END"
    );
    sqlx::query(&trigger).execute(db.pool()).await.unwrap();
}

#[tokio::test]
async fn test_product_import_stopped_by_storage_failure_keeps_counts() {
    let db = database().await;
    fail_inserts(&db, "products", "NEW.sku = 'SKU-3'").await;

    let csv = "\
sku,name,cost_price,quantity
SKU-1,Widget,1.00,1
SKU-2,Gadget,1.00,1
SKU-3,Gizmo,1.00,1
SKU-4,Doohickey,1.00,1
";
    let outcome = db.importer().import_products(csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.aborted_at_row, Some(3));
    let errors: Vec<(usize, &str)> = outcome
        .errors
        .iter()
        .map(|e| (e.row, e.error.as_str()))
        .collect();
    assert_eq!(errors, vec![(3, "persistence_error")]);

    // Rows before the failure stay applied, rows after it were never tried
    assert!(db.products().find_by_sku("SKU-2").await.unwrap().is_some());
    assert!(db.products().find_by_sku("SKU-4").await.unwrap().is_none());
}

#[tokio::test]
async fn test_order_import_stopped_by_storage_failure_keeps_counts() {
    let db = database().await;
    db.products().create(product("SKU-1", 100, 10)).await.unwrap();
    fail_inserts(&db, "orders", "NEW.order_number = 'A-3'").await;

    let csv = "\
order_number,product_sku,actual_price,quantity,payment_method,channel,status
A-1,SKU-1,2.00,1,cash,eBay,pending
A-2,SKU-1,2.00,2,cash,eBay,pending
A-3,SKU-1,2.00,4,cash,eBay,pending
A-4,SKU-1,2.00,1,cash,eBay,pending
";
    let outcome = db.importer().import_orders(csv.as_bytes()).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.aborted_at_row, Some(3));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].row, 3);

    // A-3's deduction rolled back with its insert
    assert_eq!(stock(&db, "SKU-1").await, 7);
    assert!(db.orders().find_by_number("A-4").await.unwrap().is_none());
}
