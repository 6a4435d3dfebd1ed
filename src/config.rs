use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants;
use crate::domain::Layout;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub validation: ValidationConfig,
    pub enrichment: EnrichmentConfig,
    pub reports: ReportConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    pub layout: Layout,
    /// Skip the first line of the file
    pub has_header: bool,
    /// chrono format strings, tried in order
    pub date_formats: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_INPUT_PATH),
            layout: Layout::default(),
            has_header: true,
            date_formats: constants::default_date_formats(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject zero quantities and prices
    pub require_positive: bool,
    /// Inclusive upper bound on quantity
    pub max_quantity: u32,
    /// Inclusive upper bound on unit price
    pub max_unit_price: Decimal,
    /// ISO date strings, e.g. "2024-01-01"
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    /// Extended layout only: ids must start with T / P / C
    pub require_id_prefixes: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_positive: true,
            max_quantity: constants::DEFAULT_MAX_QUANTITY,
            max_unit_price: Decimal::from(constants::DEFAULT_MAX_UNIT_PRICE),
            earliest_date: None,
            latest_date: None,
            require_id_prefixes: true,
        }
    }
}

/// Which product lookup implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    #[default]
    Http,
    Offline,
}

impl std::str::FromStr for LookupSource {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(LookupSource::Http),
            "offline" => Ok(LookupSource::Offline),
            other => Err(PipelineError::Config(format!(
                "Unknown enrichment source '{}' (expected 'http' or 'offline')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub source: LookupSource,
    pub base_url: String,
    pub timeout_ms: u64,
    /// TOML product catalogue for the offline source
    pub catalog_path: Option<PathBuf>,
    pub default_category: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            source: LookupSource::default(),
            base_url: constants::DEFAULT_CATALOG_BASE_URL.to_string(),
            timeout_ms: constants::DEFAULT_LOOKUP_TIMEOUT_MS,
            catalog_path: None,
            default_category: constants::DEFAULT_CATEGORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
    /// Products with fewer total units than this are "low performing"
    pub low_performance_threshold: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: constants::DEFAULT_TOP_N,
            low_performance_threshold: constants::DEFAULT_LOW_PERFORMANCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    /// Write JSON logs to a daily rolling file in `dir`
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            file: true,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `config.toml` in the working
    /// directory is used if present, otherwise defaults. `.env` and `SALES_*`
    /// environment variables are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let default_path = Path::new(constants::DEFAULT_CONFIG_PATH);
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if default_path.exists() => Self::from_file(default_path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `SALES_*` overrides from the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SALES_INPUT_PATH") {
            self.input.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("SALES_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(source) = lookup("SALES_ENRICHMENT_SOURCE") {
            self.enrichment.source = source.parse()?;
        }
        if let Some(url) = lookup("SALES_ENRICHMENT_BASE_URL") {
            self.enrichment.base_url = url;
        }
        if let Some(timeout) = lookup("SALES_ENRICHMENT_TIMEOUT_MS") {
            self.enrichment.timeout_ms = timeout.trim().parse().map_err(|_| {
                PipelineError::Config(format!(
                    "SALES_ENRICHMENT_TIMEOUT_MS must be an integer, got '{}'",
                    timeout
                ))
            })?;
        }
        Ok(())
    }

    /// Log where the configuration came from. Called once logging is set up.
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => info!(
                "No configuration file found ({}); using defaults",
                constants::DEFAULT_CONFIG_PATH
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.date_formats.is_empty() {
            return Err(PipelineError::Config(
                "input.date_formats must list at least one format".to_string(),
            ));
        }
        if self.reports.top_n == 0 {
            return Err(PipelineError::Config("reports.top_n must be at least 1".to_string()));
        }
        if self.enrichment.timeout_ms == 0 {
            return Err(PipelineError::Config(
                "enrichment.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let (Some(earliest), Some(latest)) =
            (self.validation.earliest_date, self.validation.latest_date)
        {
            if earliest > latest {
                return Err(PipelineError::Config(format!(
                    "validation.earliest_date {} is after latest_date {}",
                    earliest, latest
                )));
            }
        }
        if self.validation.max_unit_price.is_sign_negative() {
            return Err(PipelineError::Config(
                "validation.max_unit_price must not be negative".to_string(),
            ));
        }
        let line_limit = Decimal::from(self.validation.max_quantity)
            .checked_mul(self.validation.max_unit_price)
            .filter(|limit| *limit <= Decimal::from(constants::MAX_LINE_AMOUNT));
        if line_limit.is_none() {
            return Err(PipelineError::Config(format!(
                "validation.max_quantity × validation.max_unit_price must not exceed {}",
                constants::MAX_LINE_AMOUNT
            )));
        }
        Ok(())
    }
}
