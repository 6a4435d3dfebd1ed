pub mod render;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::pipeline::processing::aggregate::{ProductSummary, SalesAggregates};

/// The three report types produced by a full run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    SalesSummary,
    CustomerBehavior,
    RegionPerformance,
}

impl ReportKind {
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::SalesSummary => "sales_summary",
            ReportKind::CustomerBehavior => "customer_behavior",
            ReportKind::RegionPerformance => "region_performance",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::SalesSummary => "Sales Summary",
            ReportKind::CustomerBehavior => "Customer Behavior",
            ReportKind::RegionPerformance => "Region Performance",
        }
    }
}

/// One named table: fixed columns, string cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(name: &'static str, columns: &[&'static str]) -> Self {
        Self {
            name,
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    fn metric(&mut self, metric: &str, value: String) {
        self.push(vec![metric.to_string(), value]);
    }
}

/// A report is an ordered list of tables; the first is the primary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub tables: Vec<ReportTable>,
}

impl Report {
    /// `<report>.csv` for the primary table, `<report>_<table>.csv` for the rest
    pub fn file_name(&self, table_index: usize) -> String {
        match (table_index, self.tables.get(table_index)) {
            (0, _) | (_, None) => format!("{}.csv", self.kind.name()),
            (_, Some(table)) => format!("{}_{}.csv", self.kind.name(), table.name),
        }
    }

    pub fn table(&self, name: &str) -> Option<&ReportTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Money and percentages are shown to two decimal places, halves rounded away from zero
pub fn format_money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Maps aggregates onto the fixed report schemas. Formatting only.
#[derive(Debug, Default)]
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_all(&self, aggregates: &SalesAggregates) -> Vec<Report> {
        vec![
            self.sales_summary(aggregates),
            self.customer_behavior(aggregates),
            self.region_performance(aggregates),
        ]
    }

    pub fn sales_summary(&self, aggregates: &SalesAggregates) -> Report {
        let overview = &aggregates.overview;
        let mut summary = ReportTable::new("overview", &["metric", "value"]);
        summary.metric("total_revenue", format_money(overview.total_revenue));
        summary.metric("total_units", overview.total_units.to_string());
        summary.metric("total_orders", overview.total_orders.to_string());
        summary.metric("average_order_value", format_money(overview.average_order_value));
        summary.metric("unique_customers", overview.unique_customers.to_string());
        summary.metric("unique_products", overview.unique_products.to_string());
        summary.metric("first_date", format_date(overview.first_date));
        summary.metric("last_date", format_date(overview.last_date));
        summary.metric(
            "top_region",
            aggregates
                .top_regions
                .first()
                .map(|r| r.region.clone())
                .unwrap_or_default(),
        );
        summary.metric(
            "peak_day",
            format_date(aggregates.peak_day.as_ref().map(|d| d.date)),
        );
        summary.metric(
            "peak_day_revenue",
            aggregates
                .peak_day
                .as_ref()
                .map(|d| format_money(d.revenue))
                .unwrap_or_default(),
        );

        let mut top_products = ReportTable::new("top_products", &["rank", "product", "units", "revenue"]);
        for (index, product) in aggregates.top_products.iter().enumerate() {
            top_products.push(vec![
                (index + 1).to_string(),
                product.product.clone(),
                product.units.to_string(),
                format_money(product.revenue),
            ]);
        }

        let mut categories = ReportTable::new("categories", &["category", "units", "revenue"]);
        for category in &aggregates.categories {
            categories.push(vec![
                category.category.clone(),
                category.units.to_string(),
                format_money(category.revenue),
            ]);
        }

        let mut daily_trend =
            ReportTable::new("daily_trend", &["date", "revenue", "transactions", "unique_customers"]);
        for day in &aggregates.daily_trend {
            daily_trend.push(vec![
                day.date.format("%Y-%m-%d").to_string(),
                format_money(day.revenue),
                day.transactions.to_string(),
                day.unique_customers.to_string(),
            ]);
        }

        let mut low_performing =
            ReportTable::new("low_performing_products", &["product", "units", "revenue"]);
        for product in &aggregates.low_performing_products {
            low_performing.push(product_row(product));
        }

        let enrichment_summary = &aggregates.enrichment;
        let mut enrichment = ReportTable::new("enrichment", &["metric", "value"]);
        enrichment.metric("total", enrichment_summary.total.to_string());
        enrichment.metric("matched", enrichment_summary.matched.to_string());
        enrichment.metric("success_rate_pct", format_money(enrichment_summary.success_rate));
        enrichment.metric("failed_products", enrichment_summary.failed_products.join("; "));

        Report {
            kind: ReportKind::SalesSummary,
            tables: vec![summary, top_products, categories, daily_trend, low_performing, enrichment],
        }
    }

    pub fn customer_behavior(&self, aggregates: &SalesAggregates) -> Report {
        let mut customers = ReportTable::new(
            "customers",
            &[
                "customer_id",
                "orders",
                "total_spent",
                "avg_order_value",
                "distinct_products",
                "active_days",
                "first_purchase",
                "last_purchase",
                "products",
            ],
        );
        for customer in &aggregates.customers {
            customers.push(vec![
                customer.customer_id.clone(),
                customer.orders.to_string(),
                format_money(customer.total_spent),
                format_money(customer.avg_order_value),
                customer.distinct_products.to_string(),
                customer.active_days.to_string(),
                customer.first_purchase.format("%Y-%m-%d").to_string(),
                customer.last_purchase.format("%Y-%m-%d").to_string(),
                customer.products.join("; "),
            ]);
        }

        let mut top_customers = ReportTable::new("top_customers", &["rank", "customer_id", "revenue", "orders"]);
        for (index, customer) in aggregates.top_customers.iter().enumerate() {
            top_customers.push(vec![
                (index + 1).to_string(),
                customer.customer_id.clone(),
                format_money(customer.total_spent),
                customer.orders.to_string(),
            ]);
        }

        Report {
            kind: ReportKind::CustomerBehavior,
            tables: vec![customers, top_customers],
        }
    }

    pub fn region_performance(&self, aggregates: &SalesAggregates) -> Report {
        let mut regions = ReportTable::new(
            "regions",
            &[
                "rank",
                "region",
                "revenue",
                "pct_of_total",
                "transactions",
                "units",
                "avg_transaction_value",
            ],
        );
        for (index, region) in aggregates.regions.iter().enumerate() {
            regions.push(vec![
                (index + 1).to_string(),
                region.region.clone(),
                format_money(region.revenue),
                format_money(region.pct_of_total),
                region.transactions.to_string(),
                region.units.to_string(),
                format_money(region.avg_transaction_value),
            ]);
        }

        Report {
            kind: ReportKind::RegionPerformance,
            tables: vec![regions],
        }
    }
}

fn product_row(product: &ProductSummary) -> Vec<String> {
    vec![
        product.product.clone(),
        product.units.to_string(),
        format_money(product.revenue),
    ]
}
