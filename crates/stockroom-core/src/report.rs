//! # Report Aggregation
//!
//! Read-only financial summaries over a set of orders. Every figure comes
//! from the order's frozen snapshot (`profit_cents`, `unit_cost_cents`),
//! never from the product's current cost, so a report re-run later gives
//! the same totals.
//!
//! ```text
//!   orders ──► ReportFilter::matches ──► summary
//!                                    ├─► channel_stats   (per channel)
//!                                    ├─► product_stats   (per SKU, sales desc)
//!                                    └─► time_series     (per day, ascending)
//! ```
//!
//! Sums are accumulated in integer cents, so each breakdown adds up to the
//! summary exactly.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Channel, Order, OrderStatus, PaymentMethod};

// =============================================================================
// Filter
// =============================================================================

/// Which orders a report covers.
///
/// Date bounds are inclusive and compare against the calendar day (UTC) of
/// the order's effective date. An empty set places no restriction on its
/// dimension; dimensions combine with AND, members of one set with OR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct ReportFilter {
    #[serde(deserialize_with = "blank_as_none")]
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_as_none")]
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub channels: Vec<Channel>,
    pub payment_methods: Vec<PaymentMethod>,
    pub statuses: Vec<OrderStatus>,
    pub product_skus: Vec<String>,
}

/// Date pickers submit `""` for "no bound".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl ReportFilter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ValidationError::invalid(
                    "start_date",
                    format!("{start} is after end_date {end}"),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, order: &Order) -> bool {
        let day = order.effective_date().date_naive();

        self.start_date.map_or(true, |start| day >= start)
            && self.end_date.map_or(true, |end| day <= end)
            && (self.channels.is_empty() || self.channels.contains(&order.channel))
            && (self.payment_methods.is_empty()
                || self.payment_methods.contains(&order.payment_method))
            && (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && (self.product_skus.is_empty()
                || self.product_skus.iter().any(|sku| *sku == order.product_sku))
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportSummary {
    pub total_sales: Money,
    pub total_cost: Money,
    pub total_profit: Money,
    pub total_orders: i64,
    pub total_quantity: i64,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChannelStats {
    pub channel: Channel,
    pub total_sales: Money,
    pub total_cost: Money,
    pub total_profit: Money,
    pub total_quantity: i64,
    pub order_count: i64,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductStats {
    pub product_sku: String,
    pub product_name: String,
    pub total_sales: Money,
    pub total_cost: Money,
    pub total_profit: Money,
    pub quantity_sold: i64,
    pub order_count: i64,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeSeriesPoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales: Money,
    pub total_cost: Money,
    pub total_profit: Money,
    pub order_count: i64,
}

/// The four-part report plus the filter it was computed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Report {
    pub summary: ReportSummary,
    pub channel_stats: Vec<ChannelStats>,
    pub product_stats: Vec<ProductStats>,
    pub time_series: Vec<TimeSeriesPoint>,
    pub filters_applied: ReportFilter,
}

/// Running totals for one group.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    sales: Money,
    cost: Money,
    profit: Money,
    quantity: i64,
    orders: i64,
}

impl Totals {
    fn add(&mut self, order: &Order) -> CoreResult<()> {
        let overflow = || CoreError::Overflow("report totals".to_string());

        let sales = order.sales().ok_or_else(overflow)?;
        let cost = order.cost().ok_or_else(overflow)?;

        self.sales = self.sales.checked_add(sales).ok_or_else(overflow)?;
        self.cost = self.cost.checked_add(cost).ok_or_else(overflow)?;
        self.profit = self.profit.checked_add(order.profit()).ok_or_else(overflow)?;
        self.quantity = self.quantity.checked_add(order.quantity).ok_or_else(overflow)?;
        self.orders += 1;
        Ok(())
    }

    fn margin(&self) -> f64 {
        Money::percent_of(self.profit, self.sales)
    }
}

/// Aggregates the orders accepted by `filter`.
///
/// ## Example
/// ```rust
/// use stockroom_core::report::{generate_report, ReportFilter};
///
/// let report = generate_report(&ReportFilter::default(), &[]).unwrap();
/// assert_eq!(report.summary.total_orders, 0);
/// assert_eq!(report.summary.profit_margin, 0.0);
/// ```
pub fn generate_report(filter: &ReportFilter, orders: &[Order]) -> CoreResult<Report> {
    filter.validate()?;
    aggregate(filter, orders.iter().filter(|o| filter.matches(o)))
}

/// Aggregates `selected` as-is, for callers that already applied `filter`
/// at the source (the ledger store does it in SQL). `filter` is only
/// validated and echoed in `filters_applied`.
pub fn build_report(filter: &ReportFilter, selected: &[Order]) -> CoreResult<Report> {
    filter.validate()?;
    aggregate(filter, selected.iter())
}

fn aggregate<'a, I>(filter: &ReportFilter, orders: I) -> CoreResult<Report>
where
    I: Iterator<Item = &'a Order>,
{
    let mut summary = Totals::default();
    let mut by_channel: BTreeMap<Channel, Totals> = BTreeMap::new();
    let mut by_product: BTreeMap<&str, (&str, Totals)> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, Totals> = BTreeMap::new();

    for order in orders {
        summary.add(order)?;
        by_channel.entry(order.channel).or_default().add(order)?;
        by_product
            .entry(order.product_sku.as_str())
            .or_insert_with(|| (order.product_name.as_str(), Totals::default()))
            .1
            .add(order)?;
        by_day
            .entry(order.effective_date().date_naive())
            .or_default()
            .add(order)?;
    }

    let channel_stats = by_channel
        .into_iter()
        .map(|(channel, t)| ChannelStats {
            channel,
            total_sales: t.sales,
            total_cost: t.cost,
            total_profit: t.profit,
            total_quantity: t.quantity,
            order_count: t.orders,
            profit_margin: t.margin(),
        })
        .collect();

    let mut product_stats: Vec<ProductStats> = by_product
        .into_iter()
        .map(|(sku, (name, t))| ProductStats {
            product_sku: sku.to_string(),
            product_name: name.to_string(),
            total_sales: t.sales,
            total_cost: t.cost,
            total_profit: t.profit,
            quantity_sold: t.quantity,
            order_count: t.orders,
            profit_margin: t.margin(),
        })
        .collect();
    // Stable sort keeps SKU order among equal sales.
    product_stats.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));

    let time_series = by_day
        .into_iter()
        .map(|(date, t)| TimeSeriesPoint {
            date,
            total_sales: t.sales,
            total_cost: t.cost,
            total_profit: t.profit,
            order_count: t.orders,
        })
        .collect();

    Ok(Report {
        summary: ReportSummary {
            total_sales: summary.sales,
            total_cost: summary.cost,
            total_profit: summary.profit,
            total_orders: summary.orders,
            total_quantity: summary.quantity,
            profit_margin: summary.margin(),
        },
        channel_stats,
        product_stats,
        time_series,
        filters_applied: filter.clone(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn order(
        id: i64,
        sku: &str,
        channel: Channel,
        qty: i64,
        price: i64,
        unit_cost: i64,
        day: u32,
    ) -> Order {
        let at = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        Order {
            id,
            order_number: format!("ORD-{id}"),
            product_id: Some(1),
            product_sku: sku.to_string(),
            product_name: format!("{sku} name"),
            quantity: qty,
            actual_price_cents: price,
            unit_cost_cents: unit_cost,
            profit_cents: (price - unit_cost) * qty,
            payment_method: PaymentMethod::Cash,
            channel,
            status: OrderStatus::Pending,
            buyer_name: None,
            transaction_date: Some(at),
            remark: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order(1, "SKU-A", Channel::Ebay, 2, 1500, 1000, 1),
            order(2, "SKU-B", Channel::Facebook, 1, 5000, 3000, 1),
            order(3, "SKU-A", Channel::Facebook, 3, 1200, 1000, 2),
            order(4, "SKU-C", Channel::SaltFish, 1, 800, 900, 4),
        ]
    }

    #[test]
    fn test_summary_figures() {
        let report = generate_report(&ReportFilter::default(), &sample()).unwrap();
        let s = &report.summary;

        assert_eq!(s.total_sales.cents(), 3000 + 5000 + 3600 + 800);
        assert_eq!(s.total_profit.cents(), 1000 + 2000 + 600 - 100);
        assert_eq!(s.total_cost.cents(), s.total_sales.cents() - s.total_profit.cents());
        assert_eq!(s.total_orders, 4);
        assert_eq!(s.total_quantity, 7);
        assert!((s.profit_margin - 3500.0 / 12400.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdowns_sum_to_summary() {
        let report = generate_report(&ReportFilter::default(), &sample()).unwrap();
        let s = &report.summary;

        let channel_sales: Money = report.channel_stats.iter().map(|c| c.total_sales).sum();
        let channel_cost: Money = report.channel_stats.iter().map(|c| c.total_cost).sum();
        let product_profit: Money = report.product_stats.iter().map(|p| p.total_profit).sum();
        let daily_sales: Money = report.time_series.iter().map(|d| d.total_sales).sum();

        assert_eq!(channel_sales, s.total_sales);
        assert_eq!(channel_cost, s.total_cost);
        assert_eq!(product_profit, s.total_profit);
        assert_eq!(daily_sales, s.total_sales);
    }

    #[test]
    fn test_product_stats_sorted_by_sales() {
        let report = generate_report(&ReportFilter::default(), &sample()).unwrap();
        let skus: Vec<&str> = report
            .product_stats
            .iter()
            .map(|p| p.product_sku.as_str())
            .collect();
        assert_eq!(skus, vec!["SKU-A", "SKU-B", "SKU-C"]);

        let a = &report.product_stats[0];
        assert_eq!(a.quantity_sold, 5);
        assert_eq!(a.order_count, 2);
        assert!(report.product_stats[2].profit_margin < 0.0);
    }

    #[test]
    fn test_time_series_one_point_per_day_ascending() {
        let report = generate_report(&ReportFilter::default(), &sample()).unwrap();
        let days: Vec<String> = report.time_series.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(days, vec!["2025-03-01", "2025-03-02", "2025-03-04"]);
        assert_eq!(report.time_series[0].order_count, 2);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 2),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 4),
            ..Default::default()
        };
        let report = generate_report(&filter, &sample()).unwrap();
        assert_eq!(report.summary.total_orders, 2);
    }

    #[test]
    fn test_effective_date_falls_back_to_created_at() {
        let mut o = order(9, "SKU-A", Channel::Ebay, 1, 100, 50, 1);
        o.transaction_date = None;
        o.created_at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();

        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..Default::default()
        };
        assert!(filter.matches(&o));
    }

    #[test]
    fn test_dimensions_and_within_or() {
        let filter = ReportFilter {
            channels: vec![Channel::Facebook, Channel::SaltFish],
            product_skus: vec!["SKU-A".to_string()],
            ..Default::default()
        };
        let report = generate_report(&filter, &sample()).unwrap();
        assert_eq!(report.summary.total_orders, 1);
        assert_eq!(report.channel_stats.len(), 1);
        assert_eq!(report.channel_stats[0].channel, Channel::Facebook);
    }

    #[test]
    fn test_empty_selection_has_zero_margin() {
        let filter = ReportFilter {
            statuses: vec![OrderStatus::Done],
            ..Default::default()
        };
        let report = generate_report(&filter, &sample()).unwrap();
        assert_eq!(report.summary.total_orders, 0);
        assert_eq!(report.summary.profit_margin, 0.0);
        assert!(report.channel_stats.is_empty());
        assert!(report.time_series.is_empty());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        assert!(matches!(
            generate_report(&filter, &sample()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_build_report_takes_selection_as_given() {
        let filter = ReportFilter {
            channels: vec![Channel::Facebook],
            ..Default::default()
        };
        let selected: Vec<Order> = sample()
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect();

        let built = build_report(&filter, &selected).unwrap();
        assert_eq!(built, generate_report(&filter, &sample()).unwrap());
        assert_eq!(built.summary.total_orders, 2);
        assert_eq!(built.filters_applied, filter);

        let inverted = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        assert!(build_report(&inverted, &selected).is_err());
    }

    #[test]
    fn test_filter_accepts_blank_dates() {
        let json = r#"{"start_date":"","end_date":"2025-03-02","channels":["eBay"]}"#;
        let filter: ReportFilter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.start_date, None);
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2025, 3, 2));
        assert_eq!(filter.channels, vec![Channel::Ebay]);
        assert!(filter.statuses.is_empty());
    }
}
