use std::fs::{self, OpenOptions};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::processing::filter::TransactionFilter;
use crate::pipeline::RunSummary;

/// One row of the append-only run history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLogEntry {
    pub run_id: Uuid,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub region: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub parsed: Option<usize>,
    pub accepted: Option<usize>,
    pub rejected: Option<usize>,
    pub retained: Option<usize>,
    pub error: Option<String>,
}

impl RunLogEntry {
    pub fn new(run_id: Uuid, filter: &TransactionFilter, outcome: std::result::Result<&RunSummary, String>) -> Self {
        let (summary, error) = match outcome {
            Ok(summary) => (Some(summary), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            run_id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            region: filter.region.clone(),
            min_amount: filter.min_amount,
            max_amount: filter.max_amount,
            parsed: summary.map(|s| s.counts.parsed),
            accepted: summary.map(|s| s.counts.accepted),
            rejected: summary.map(|s| s.counts.rejected),
            retained: summary.map(|s| s.filter.retained),
            error,
        }
    }
}

/// Append an entry, writing the header only when the file is new
pub fn append_run_log(path: &Path, entry: &RunLogEntry) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let is_new = !path.exists() || fs::metadata(path)?.len() == 0;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
    writer.serialize(entry)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn failed_entry() -> RunLogEntry {
        let filter = TransactionFilter {
            region: Some("North".to_string()),
            min_amount: Some(dec!(100)),
            max_amount: None,
        };
        RunLogEntry::new(Uuid::new_v4(), &filter, Err("input missing".to_string()))
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run_log.csv");

        append_run_log(&path, &failed_entry()).unwrap();
        append_run_log(&path, &failed_entry()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "run_id,timestamp,region,min_amount,max_amount,parsed,accepted,rejected,retained,error"
        );
        assert!(lines[1].ends_with(",North,100,,,,,,input missing"));
    }
}
