/// File and format constants shared across the pipeline.
/// These define the default locations and names of every artifact a run reads or writes.

// Input
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_INPUT_PATH: &str = "data/sales_data.txt";
pub const FIELD_DELIMITER: char = '|';

// Output artifacts (relative to the output directory)
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const ENRICHED_FILE_NAME: &str = "enriched_sales_data.txt";
pub const SALES_REPORT_FILE_NAME: &str = "sales_report.txt";
pub const VALIDATION_SUMMARY_FILE_NAME: &str = "validation_summary.txt";
pub const REJECTIONS_FILE_NAME: &str = "rejections.csv";
pub const RUN_LOG_FILE_NAME: &str = "run_log.csv";

// Logging
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "sales_pipeline.log";

// Enrichment
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://dummyjson.com";
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;

// Validation bounds
pub const DEFAULT_MAX_QUANTITY: u32 = 10_000;
pub const DEFAULT_MAX_UNIT_PRICE: i64 = 1_000_000;
/// Ceiling on max_quantity × max_unit_price; keeps revenue sums inside `Decimal` range
pub const MAX_LINE_AMOUNT: i64 = 1_000_000_000_000_000;

// Reports
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_LOW_PERFORMANCE_THRESHOLD: u64 = 10;

/// Date formats tried in order when normalizing the date column.
/// Month-first slash dates are left out so `05/01/2024` always reads as 5 January.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y%m%d",
];

/// Get the default date formats as owned strings (for configuration defaults)
pub fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}
