use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::app::ports::EnrichOutputPort;
use crate::domain::{EnrichedTransaction, Schema};
use crate::error::Result;
use crate::pipeline::processing::report::format_money;

const ENRICHMENT_HEADERS: [&str; 5] = ["Category", "EnrichedPrice", "Brand", "Rating", "Matched"];

/// File-based implementation of EnrichOutputPort.
/// Writes enriched transactions as a pipe-delimited file with a header row.
pub struct FileEnrichOutputAdapter {
    file_path: PathBuf,
}

impl FileEnrichOutputAdapter {
    pub fn new(file_path: &Path) -> Result<Self> {
        if let Some(dir) = file_path.parent() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            file_path: file_path.to_path_buf(),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

pub fn header(schema: &Schema) -> Vec<&'static str> {
    schema
        .columns()
        .iter()
        .map(|column| column.header())
        .chain(ENRICHMENT_HEADERS)
        .collect()
}

fn row(schema: &Schema, record: &EnrichedTransaction) -> Vec<String> {
    let mut fields: Vec<String> = schema
        .columns()
        .iter()
        .map(|column| record.transaction.field(*column))
        .collect();
    fields.push(record.category.clone());
    fields.push(format_money(record.current_price));
    fields.push(record.brand.clone().unwrap_or_default());
    fields.push(record.rating.map(|r| r.to_string()).unwrap_or_default());
    fields.push(record.is_matched().to_string());
    fields
}

#[async_trait]
impl EnrichOutputPort for FileEnrichOutputAdapter {
    async fn write_enriched(&self, schema: &Schema, records: &[EnrichedTransaction]) -> Result<()> {
        info!("Creating enriched output file: {}", self.file_path.display());

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'|')
            .from_path(&self.file_path)?;
        writer.write_record(header(schema))?;
        for record in records {
            writer.write_record(row(schema, record))?;
        }
        writer.flush()?;

        info!("Wrote {} enriched transactions", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnrichmentSource, Transaction};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn create_test_enriched() -> EnrichedTransaction {
        EnrichedTransaction {
            transaction: Transaction {
                line: 2,
                transaction_id: Some("T001".to_string()),
                date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                customer: "C001".to_string(),
                product_id: Some("P101".to_string()),
                product: "Widget, Deluxe".to_string(),
                quantity: 3,
                unit_price: dec!(19.99),
                region: "East".to_string(),
            },
            category: "Uncategorized".to_string(),
            current_price: dec!(19.99),
            brand: None,
            rating: None,
            source: EnrichmentSource::Fallback {
                reason: "product source unavailable: refused".to_string(),
            },
        }
    }

    #[test]
    fn test_header_follows_layout() {
        assert_eq!(
            header(&Schema::basic()).join("|"),
            "Date|CustomerID|ProductName|Quantity|UnitPrice|Region|Category|EnrichedPrice|Brand|Rating|Matched"
        );
        assert!(header(&Schema::extended()).join("|").starts_with("TransactionID|Date|ProductID|ProductName"));
    }

    #[tokio::test]
    async fn test_writes_pipe_delimited_rows() {
        let dir = TempDir::new().unwrap();
        let adapter = FileEnrichOutputAdapter::new(&dir.path().join("out/enriched.txt")).unwrap();

        adapter
            .write_enriched(&Schema::extended(), &[create_test_enriched()])
            .await
            .unwrap();

        let content = fs::read_to_string(adapter.file_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "T001|2024-01-05|P101|Widget, Deluxe|3|19.99|C001|East|Uncategorized|19.99|||false"
        );
    }
}
