use std::fs;
use std::path::Path;

use rust_decimal_macros::dec;
use sales_pipeline::config::{Config, LookupSource};
use sales_pipeline::infra::LocalCatalogLookup;
use sales_pipeline::pipeline::processing::filter::TransactionFilter;
use sales_pipeline::pipeline::Pipeline;
use tempfile::TempDir;

const SALES: &str = "\
Date|CustomerID|ProductName|Quantity|UnitPrice|Region
2024-01-05|C001|Widget, Deluxe|3|19.99|East
2024-01-05|C002|Laptop|1|1,299.00|North
2024-01-06|C001|Mouse|2|25.50|east
2024-01-06|C003|Keyboard|two|45.00|West
2024-01-07|C004|Headphones|2|59.99
2024-01-07|C005|Laptop|0|1299.00|North
";

const CATALOG: &str = r#"
[[products]]
name = "Laptop"
category = "laptops"
price = 1349.00
brand = "Apple"

[[products]]
name = "Mouse"
category = "accessories"
price = 24.99
"#;

fn create_test_config(dir: &Path) -> Config {
    let input = dir.join("sales_data.txt");
    fs::write(&input, SALES).unwrap();

    let mut config = Config::default();
    config.input.path = input;
    config.output.dir = dir.join("output");
    config.logging.file = false;
    config.enrichment.source = LookupSource::Offline;
    config
}

fn catalog() -> Box<LocalCatalogLookup> {
    Box::new(LocalCatalogLookup::from_toml(CATALOG).unwrap())
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join("output").join(name)).unwrap()
}

#[tokio::test]
async fn test_full_run_writes_every_artifact() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()));

    let summary = pipeline.run(TransactionFilter::default(), catalog()).await.unwrap();

    assert_eq!(summary.counts.parsed, 6);
    assert_eq!(summary.counts.accepted, 3);
    assert_eq!(summary.counts.rejected, 3);
    assert!(summary.counts.is_balanced());
    assert_eq!(summary.enriched, 3);
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.reports, 3);

    for name in [
        "enriched_sales_data.txt",
        "validation_summary.txt",
        "rejections.csv",
        "sales_report.txt",
        "sales_summary.csv",
        "sales_summary_top_products.csv",
        "customer_behavior.csv",
        "region_performance.csv",
        "run_log.csv",
    ] {
        assert!(dir.path().join("output").join(name).exists(), "missing {name}");
    }
}

#[tokio::test]
async fn test_scenario_line_and_fallback_in_enriched_file() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()));
    pipeline.run(TransactionFilter::default(), catalog()).await.unwrap();

    let enriched = read(dir.path(), "enriched_sales_data.txt");
    let lines: Vec<&str> = enriched.lines().collect();
    assert_eq!(
        lines[0],
        "Date|CustomerID|ProductName|Quantity|UnitPrice|Region|Category|EnrichedPrice|Brand|Rating|Matched"
    );
    assert_eq!(
        lines[1],
        "2024-01-05|C001|Widget, Deluxe|3|19.99|East|Uncategorized|19.99|||false"
    );
    assert_eq!(
        lines[2],
        "2024-01-05|C002|Laptop|1|1299.00|North|laptops|1349.00|Apple||true"
    );
    // Region is title-cased during normalization
    assert!(lines[3].starts_with("2024-01-06|C001|Mouse|2|25.50|East|accessories"));
}

#[tokio::test]
async fn test_rejections_are_recorded_with_stage_and_reason() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()));
    let outcome = pipeline.clean().await.unwrap();

    assert_eq!(outcome.counts.rejected, 3);
    let rejections = read(dir.path(), "rejections.csv");
    let lines: Vec<&str> = rejections.lines().collect();
    assert_eq!(lines[0], "line,stage,reason,detail,raw");
    assert!(lines[1].starts_with("5,normalization,invalid_number,"));
    assert!(lines[2].starts_with("6,parse,missing_field,missing field: region,"));
    assert!(lines[3].starts_with("7,validation,non_positive,"));

    let summary = read(dir.path(), "validation_summary.txt");
    assert!(summary.contains("Records parsed:   6"));
    assert!(summary.contains("Records accepted: 3"));

    // Cleaning alone writes no enrichment output
    assert!(!dir.path().join("output/enriched_sales_data.txt").exists());
}

#[tokio::test]
async fn test_reports_reflect_aggregates() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()));
    pipeline.run(TransactionFilter::default(), catalog()).await.unwrap();

    let overview = read(dir.path(), "sales_summary.csv");
    assert!(overview.contains("total_revenue,1409.97"));
    assert!(overview.contains("total_orders,3"));

    let regions = read(dir.path(), "region_performance.csv");
    let lines: Vec<&str> = regions.lines().collect();
    assert_eq!(lines[1], "1,North,1299.00,92.13,1,1,1299.00");
    assert_eq!(lines[2], "2,East,110.97,7.87,2,5,55.49");

    let customers = read(dir.path(), "customer_behavior_top_customers.csv");
    assert!(customers.lines().nth(1).unwrap().starts_with("1,C002,1299.00,1"));

    let text = read(dir.path(), "sales_report.txt");
    assert!(text.contains("Sales Summary"));
    assert!(text.contains("Customer Behavior"));
}

#[tokio::test]
async fn test_filters_report_removals() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()));
    let filter = TransactionFilter {
        region: Some("EAST".to_string()),
        min_amount: Some(dec!(55)),
        max_amount: None,
    };

    let summary = pipeline.run(filter, catalog()).await.unwrap();

    assert_eq!(summary.filter.input, 3);
    assert_eq!(summary.filter.filtered_by_region, 1);
    assert_eq!(summary.filter.filtered_by_amount, 1);
    assert_eq!(summary.filter.retained, 1);
    assert_eq!(summary.enriched, 1);

    let run_log = read(dir.path(), "run_log.csv");
    assert!(run_log.lines().nth(1).unwrap().contains(",EAST,55,,6,3,3,1,"));
}

#[tokio::test]
async fn test_run_log_records_failures() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    let pipeline = Pipeline::new(config.clone());
    pipeline.run(TransactionFilter::default(), catalog()).await.unwrap();

    config.input.path = dir.path().join("missing.txt");
    let pipeline = Pipeline::new(config);
    let error = pipeline
        .run(TransactionFilter::default(), catalog())
        .await
        .unwrap_err();
    assert!(error.to_string().contains("missing.txt"));

    let run_log = read(dir.path(), "run_log.csv");
    let lines: Vec<&str> = run_log.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("run_id,timestamp"));
    assert!(lines[2].contains("Failed to read input file"));
}

#[tokio::test]
async fn test_zero_valid_records_still_completes() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    fs::write(&config.input.path, "Date|CustomerID|ProductName|Quantity|UnitPrice|Region\n").unwrap();
    let pipeline = Pipeline::new(config);

    let summary = pipeline
        .run(TransactionFilter::default(), Box::new(LocalCatalogLookup::empty()))
        .await
        .unwrap();

    assert_eq!(summary.counts.parsed, 0);
    assert_eq!(summary.enriched, 0);
    let overview = read(dir.path(), "sales_summary.csv");
    assert!(overview.contains("total_revenue,0.00"));
}
