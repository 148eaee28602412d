//! # Demo Data Seeder
//!
//! Populates a ledger with products and a spread of orders so the report
//! endpoints have something to show.
//!
//! ## Usage
//! ```bash
//! # 200 orders (default) into ./stockroom_dev.db
//! cargo run -p stockroom-db --bin seed
//!
//! cargo run -p stockroom-db --bin seed -- --orders 1000 --db ./data/stockroom.db
//! ```
//!
//! Orders go through the stock engine, so product quantities end up
//! consistent with the seeded orders.

use chrono::{Duration, TimeZone, Utc};
use std::env;
use stockroom_core::{Channel, CreateOrderRequest, CreateProductRequest, OrderStatus, PaymentMethod};
use stockroom_db::{Database, DbConfig};

/// `(sku, name, cost_cents, list_price_cents)`
const CATALOGUE: &[(&str, &str, i64, i64)] = &[
    ("CAM-A7III", "Mirrorless Camera Body", 120_000, 165_000),
    ("LENS-2470", "24-70mm f/2.8 Lens", 80_000, 119_900),
    ("LENS-50", "50mm f/1.8 Lens", 9_000, 18_900),
    ("TRI-CF", "Carbon Fibre Tripod", 7_500, 14_900),
    ("SD-128", "128GB SD Card", 1_800, 3_900),
    ("BAT-FZ", "Spare Battery", 2_500, 5_900),
    ("BAG-SLING", "Sling Camera Bag", 3_000, 7_900),
    ("STRAP-L", "Leather Strap", 900, 2_900),
];

const STOCK_PER_PRODUCT: i64 = 400;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut order_count: usize = 200;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-n" => {
                if i + 1 < args.len() {
                    order_count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Demo Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --orders <N>   Number of orders to create (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Demo Data Seeder");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Orders:   {}", order_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products; skipping seed.", existing);
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (sku, name, cost, list) in CATALOGUE {
        db.products()
            .create(CreateProductRequest {
                sku: sku.to_string(),
                name: name.to_string(),
                cost_price_cents: *cost,
                quantity: STOCK_PER_PRODUCT,
                preset_price_cents: Some(*list),
                actual_price_cents: None,
            })
            .await?;
    }
    println!("✓ {} products created", CATALOGUE.len());

    let start = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).single().unwrap_or_else(Utc::now);
    let mut created = 0;
    let mut rejected = 0;

    for n in 0..order_count {
        let (sku, _, _, list) = CATALOGUE[n % CATALOGUE.len()];
        // Deterministic spread: discounts of 0-15%, one to three units, ~90 days
        let discount = (n as i64 * 7) % 16;
        let request = CreateOrderRequest {
            order_number: None,
            product_sku: sku.to_string(),
            quantity: 1 + (n as i64 % 3),
            actual_price_cents: list - list * discount / 100,
            payment_method: if n % 4 == 0 { PaymentMethod::Cash } else { PaymentMethod::PayId },
            channel: Channel::ALL[n % Channel::ALL.len()],
            status: if n % 5 == 0 { OrderStatus::Pending } else { OrderStatus::Done },
            buyer_name: Some(format!("Buyer {:03}", n % 97)),
            transaction_date: Some(start + Duration::hours((n as i64 * 11) % (90 * 24))),
            remark: None,
        };

        match db.orders().create(request).await {
            Ok(_) => created += 1,
            Err(e) => {
                eprintln!("  order {} rejected: {}", n, e);
                rejected += 1;
            }
        }
    }

    println!("✓ {} orders created, {} rejected", created, rejected);
    db.close().await;
    Ok(())
}
