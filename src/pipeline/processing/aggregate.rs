use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::ReportConfig;
use crate::domain::EnrichedTransaction;

/// Headline figures for the whole batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_revenue: Decimal,
    pub total_units: u64,
    pub total_orders: usize,
    /// revenue / orders, zero for an empty batch
    pub average_order_value: Decimal,
    pub unique_customers: usize,
    pub unique_products: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product: String,
    pub units: u64,
    pub revenue: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub orders: usize,
    pub total_spent: Decimal,
    pub avg_order_value: Decimal,
    pub distinct_products: usize,
    /// Sorted product names
    pub products: Vec<String>,
    pub active_days: usize,
    pub first_purchase: NaiveDate,
    pub last_purchase: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub revenue: Decimal,
    /// Share of total revenue in percent, 2 dp
    pub pct_of_total: Decimal,
    pub transactions: usize,
    pub units: u64,
    pub avg_transaction_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub transactions: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub units: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub matched: usize,
    /// matched / total in percent, 2 dp
    pub success_rate: Decimal,
    /// Distinct product names that fell back, sorted
    pub failed_products: Vec<String>,
}

/// Everything the report builder needs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesAggregates {
    pub overview: Overview,
    /// All products, revenue desc then name asc
    pub products: Vec<ProductSummary>,
    pub top_products: Vec<ProductSummary>,
    /// All customers, spend desc then id asc
    pub customers: Vec<CustomerSummary>,
    pub top_customers: Vec<CustomerSummary>,
    /// All regions, revenue desc then name asc
    pub regions: Vec<RegionSummary>,
    pub top_regions: Vec<RegionSummary>,
    /// Ascending by date
    pub daily_trend: Vec<DailySales>,
    pub peak_day: Option<DailySales>,
    /// Units asc then name asc
    pub low_performing_products: Vec<ProductSummary>,
    pub categories: Vec<CategorySummary>,
    pub enrichment: EnrichmentSummary,
}

/// Pure aggregation over an enriched batch
#[derive(Debug, Clone)]
pub struct SalesAggregator {
    pub top_n: usize,
    pub low_performance_threshold: u64,
}

impl Default for SalesAggregator {
    fn default() -> Self {
        Self::with_config(&ReportConfig::default())
    }
}

impl SalesAggregator {
    pub fn with_config(config: &ReportConfig) -> Self {
        Self {
            top_n: config.top_n,
            low_performance_threshold: config.low_performance_threshold,
        }
    }

    #[instrument(skip_all, fields(transactions = records.len()))]
    pub fn aggregate(&self, records: &[EnrichedTransaction]) -> SalesAggregates {
        let products = product_summaries(records);
        let customers = customer_summaries(records);
        let regions = region_summaries(records);
        let daily_trend = daily_trend(records);
        let peak_day = peak_day(&daily_trend);

        let mut low_performing_products: Vec<ProductSummary> = products
            .iter()
            .filter(|p| p.units < self.low_performance_threshold)
            .cloned()
            .collect();
        low_performing_products.sort_by(|a, b| a.units.cmp(&b.units).then_with(|| a.product.cmp(&b.product)));

        let aggregates = SalesAggregates {
            overview: overview(records, &products, &customers),
            top_products: products.iter().take(self.top_n).cloned().collect(),
            top_customers: customers.iter().take(self.top_n).cloned().collect(),
            top_regions: regions.iter().take(self.top_n).cloned().collect(),
            products,
            customers,
            regions,
            daily_trend,
            peak_day,
            low_performing_products,
            categories: category_summaries(records),
            enrichment: enrichment_summary(records),
        };

        info!(
            revenue = %aggregates.overview.total_revenue,
            products = aggregates.products.len(),
            customers = aggregates.customers.len(),
            regions = aggregates.regions.len(),
            "Aggregation complete"
        );
        aggregates
    }
}

fn units(record: &EnrichedTransaction) -> u64 {
    u64::from(record.transaction.quantity)
}

/// Percentage of `part` in `whole`, 2 dp; zero when `whole` is zero
fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part * Decimal::ONE_HUNDRED / whole)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

fn overview(
    records: &[EnrichedTransaction],
    products: &[ProductSummary],
    customers: &[CustomerSummary],
) -> Overview {
    let total_revenue: Decimal = records.iter().map(|r| r.revenue()).sum();
    Overview {
        total_revenue,
        total_units: records.iter().map(units).sum(),
        total_orders: records.len(),
        average_order_value: average(total_revenue, records.len()),
        unique_customers: customers.len(),
        unique_products: products.len(),
        first_date: records.iter().map(|r| r.transaction.date).min(),
        last_date: records.iter().map(|r| r.transaction.date).max(),
    }
}

fn product_summaries(records: &[EnrichedTransaction]) -> Vec<ProductSummary> {
    let mut by_product: BTreeMap<&str, ProductSummary> = BTreeMap::new();
    for record in records {
        let name = record.transaction.product.as_str();
        let entry = by_product.entry(name).or_insert_with(|| ProductSummary {
            product: name.to_string(),
            units: 0,
            revenue: Decimal::ZERO,
            transactions: 0,
        });
        entry.units += units(record);
        entry.revenue += record.revenue();
        entry.transactions += 1;
    }

    let mut products: Vec<ProductSummary> = by_product.into_values().collect();
    products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.product.cmp(&b.product)));
    products
}

fn customer_summaries(records: &[EnrichedTransaction]) -> Vec<CustomerSummary> {
    let mut grouped: BTreeMap<&str, Vec<&EnrichedTransaction>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.transaction.customer.as_str()).or_default().push(record);
    }

    let mut customers: Vec<CustomerSummary> = grouped
        .into_iter()
        .filter_map(|(customer_id, purchases)| {
            let total_spent: Decimal = purchases.iter().map(|r| r.revenue()).sum();
            let products: BTreeSet<&str> = purchases.iter().map(|r| r.transaction.product.as_str()).collect();
            let days: BTreeSet<NaiveDate> = purchases.iter().map(|r| r.transaction.date).collect();
            Some(CustomerSummary {
                customer_id: customer_id.to_string(),
                orders: purchases.len(),
                total_spent,
                avg_order_value: average(total_spent, purchases.len()),
                distinct_products: products.len(),
                products: products.into_iter().map(str::to_string).collect(),
                active_days: days.len(),
                first_purchase: *days.iter().next()?,
                last_purchase: *days.iter().next_back()?,
            })
        })
        .collect();

    customers.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    customers
}

fn region_summaries(records: &[EnrichedTransaction]) -> Vec<RegionSummary> {
    let total_revenue: Decimal = records.iter().map(|r| r.revenue()).sum();
    let mut by_region: BTreeMap<&str, (Decimal, usize, u64)> = BTreeMap::new();
    for record in records {
        let entry = by_region
            .entry(record.transaction.region.as_str())
            .or_insert((Decimal::ZERO, 0, 0));
        entry.0 += record.revenue();
        entry.1 += 1;
        entry.2 += units(record);
    }

    let mut regions: Vec<RegionSummary> = by_region
        .into_iter()
        .map(|(region, (revenue, transactions, units))| RegionSummary {
            region: region.to_string(),
            revenue,
            pct_of_total: percent(revenue, total_revenue),
            transactions,
            units,
            avg_transaction_value: average(revenue, transactions),
        })
        .collect();
    regions.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.region.cmp(&b.region)));
    regions
}

fn daily_trend(records: &[EnrichedTransaction]) -> Vec<DailySales> {
    let mut by_date: BTreeMap<NaiveDate, (Decimal, usize, BTreeSet<&str>)> = BTreeMap::new();
    for record in records {
        let entry = by_date
            .entry(record.transaction.date)
            .or_insert_with(|| (Decimal::ZERO, 0, BTreeSet::new()));
        entry.0 += record.revenue();
        entry.1 += 1;
        entry.2.insert(record.transaction.customer.as_str());
    }

    by_date
        .into_iter()
        .map(|(date, (revenue, transactions, customers))| DailySales {
            date,
            revenue,
            transactions,
            unique_customers: customers.len(),
        })
        .collect()
}

/// Highest revenue day; the earliest date wins a tie
fn peak_day(trend: &[DailySales]) -> Option<DailySales> {
    trend
        .iter()
        .fold(None::<&DailySales>, |best, day| match best {
            Some(best) if best.revenue >= day.revenue => Some(best),
            _ => Some(day),
        })
        .cloned()
}

fn category_summaries(records: &[EnrichedTransaction]) -> Vec<CategorySummary> {
    let mut by_category: BTreeMap<&str, (u64, Decimal)> = BTreeMap::new();
    for record in records {
        let entry = by_category
            .entry(record.category.as_str())
            .or_insert((0, Decimal::ZERO));
        entry.0 += units(record);
        entry.1 += record.revenue();
    }

    let mut categories: Vec<CategorySummary> = by_category
        .into_iter()
        .map(|(category, (units, revenue))| CategorySummary {
            category: category.to_string(),
            units,
            revenue,
        })
        .collect();
    categories.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.category.cmp(&b.category)));
    categories
}

fn enrichment_summary(records: &[EnrichedTransaction]) -> EnrichmentSummary {
    let matched = records.iter().filter(|r| r.is_matched()).count();
    let failed: BTreeSet<&str> = records
        .iter()
        .filter(|r| !r.is_matched())
        .map(|r| r.transaction.product.as_str())
        .collect();

    EnrichmentSummary {
        total: records.len(),
        matched,
        success_rate: percent(Decimal::from(matched), Decimal::from(records.len())),
        failed_products: failed.into_iter().map(str::to_string).collect(),
    }
}
