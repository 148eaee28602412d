//! Report generation over stored orders.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{database, order, product};
use stockroom_core::report::{generate_report, ReportFilter};
use stockroom_core::{Channel, Money, OrderStatus, PaymentMethod};
use stockroom_db::Database;

async fn seeded() -> Database {
    let db = database().await;
    db.products().create(product("SKU-1", 1000, 50)).await.unwrap();
    db.products().create(product("SKU-2", 250, 50)).await.unwrap();

    let rows = [
        ("SKU-1", 2, 1500, Channel::Ebay, PaymentMethod::Cash, 1),
        ("SKU-2", 4, 500, Channel::Facebook, PaymentMethod::PayId, 1),
        ("SKU-1", 1, 900, Channel::SaltFish, PaymentMethod::Cash, 3),
        ("SKU-2", 10, 400, Channel::Ebay, PaymentMethod::PayId, 7),
    ];
    for (sku, qty, price, channel, method, day) in rows {
        let mut draft = order(sku, qty, price);
        draft.channel = channel;
        draft.payment_method = method;
        draft.transaction_date = Some(Utc.with_ymd_and_hms(2025, 3, day, 15, 0, 0).unwrap());
        db.orders().create(draft).await.unwrap();
    }
    db
}

#[tokio::test]
async fn test_report_breakdowns_sum_to_summary() {
    let db = seeded().await;
    let report = db.reports().generate(&ReportFilter::default()).await.unwrap();
    let s = &report.summary;

    assert_eq!(s.total_orders, 4);
    assert_eq!(s.total_quantity, 17);
    assert_eq!(s.total_sales.cents(), 3000 + 2000 + 900 + 4000);
    assert_eq!(s.total_profit.cents(), 1000 + 1000 - 100 + 1500);
    assert_eq!(s.total_cost, s.total_sales - s.total_profit);

    let channel_sales: Money = report.channel_stats.iter().map(|c| c.total_sales).sum();
    let product_profit: Money = report.product_stats.iter().map(|p| p.total_profit).sum();
    let daily_sales: Money = report.time_series.iter().map(|d| d.total_sales).sum();
    assert_eq!(channel_sales, s.total_sales);
    assert_eq!(product_profit, s.total_profit);
    assert_eq!(daily_sales, s.total_sales);

    assert_eq!(report.product_stats[0].product_sku, "SKU-2");
    assert_eq!(report.time_series.len(), 3);
}

#[tokio::test]
async fn test_report_filters_combine() {
    let db = seeded().await;

    let filter = ReportFilter {
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 3),
        payment_methods: vec![PaymentMethod::Cash],
        ..Default::default()
    };
    let report = db.reports().generate(&filter).await.unwrap();

    assert_eq!(report.summary.total_orders, 2);
    assert_eq!(report.summary.total_sales.cents(), 3900);
    assert_eq!(report.filters_applied, filter);
}

#[tokio::test]
async fn test_report_is_stable_after_product_deleted() {
    let db = seeded().await;
    let before = db.reports().generate(&ReportFilter::default()).await.unwrap();

    db.products().delete("SKU-1").await.unwrap();
    let after = db.reports().generate(&ReportFilter::default()).await.unwrap();

    assert_eq!(before.summary, after.summary);
    assert_eq!(before.product_stats, after.product_stats);
}

#[tokio::test]
async fn test_empty_ledger_report() {
    let db = database().await;
    let report = db.reports().generate(&ReportFilter::default()).await.unwrap();

    assert_eq!(report.summary.total_orders, 0);
    assert_eq!(report.summary.profit_margin, 0.0);
    assert!(report.product_stats.is_empty());
}

#[tokio::test]
async fn test_sql_filter_selects_same_orders_as_in_memory_filter() {
    let db = seeded().await;

    // Undated order, so the day comes from created_at
    let mut undated = order("SKU-1", 3, 1200);
    undated.status = OrderStatus::Done;
    undated.channel = Channel::Facebook;
    db.orders().create(undated).await.unwrap();

    let today = Utc::now().date_naive();
    let filters = [
        ReportFilter::default(),
        ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 7),
            ..Default::default()
        },
        ReportFilter {
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        },
        ReportFilter {
            start_date: Some(today),
            ..Default::default()
        },
        ReportFilter {
            channels: vec![Channel::Ebay, Channel::Facebook],
            statuses: vec![OrderStatus::Pending],
            ..Default::default()
        },
        ReportFilter {
            statuses: vec![OrderStatus::Done],
            ..Default::default()
        },
        ReportFilter {
            product_skus: vec!["SKU-2".to_string(), "SKU-9".to_string()],
            payment_methods: vec![PaymentMethod::PayId],
            ..Default::default()
        },
    ];

    let all = db.orders().list().await.unwrap();
    for filter in filters {
        let from_sql = db.reports().generate(&filter).await.unwrap();
        let in_memory = generate_report(&filter, &all).unwrap();
        assert_eq!(from_sql, in_memory, "filter {filter:?}");
    }

    let undated_only = ReportFilter {
        start_date: Some(today),
        ..Default::default()
    };
    let report = db.reports().generate(&undated_only).await.unwrap();
    assert_eq!(report.summary.total_orders, 1);
    assert_eq!(report.summary.total_quantity, 3);
}
