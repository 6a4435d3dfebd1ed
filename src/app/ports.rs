use async_trait::async_trait;

use crate::domain::{EnrichedTransaction, ProductInfo, Rejection, Schema};
use crate::error::{LookupError, Result};
use crate::pipeline::processing::quality_gate::ValidationCounts;
use crate::pipeline::processing::report::Report;

/// Product metadata source used by the enricher
#[async_trait]
pub trait ProductLookupPort: Send + Sync {
    /// Look up category and current price by product name
    async fn lookup(&self, product: &str) -> std::result::Result<ProductInfo, LookupError>;

    /// Short label for logs and metrics
    fn name(&self) -> &'static str;
}

/// Sink for the cleaning stage artifacts
#[async_trait]
pub trait ValidationOutputPort: Send + Sync {
    async fn write_summary(&self, counts: &ValidationCounts) -> Result<()>;
    async fn write_rejections(&self, rejections: &[Rejection]) -> Result<()>;
}

/// Sink for the enriched transaction file
#[async_trait]
pub trait EnrichOutputPort: Send + Sync {
    async fn write_enriched(&self, schema: &Schema, records: &[EnrichedTransaction]) -> Result<()>;
}

/// Sink for built reports
#[async_trait]
pub trait ReportOutputPort: Send + Sync {
    async fn write_reports(&self, reports: &[Report]) -> Result<()>;
}
