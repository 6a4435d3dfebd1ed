use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::app::ports::ValidationOutputPort;
use crate::constants::{REJECTIONS_FILE_NAME, VALIDATION_SUMMARY_FILE_NAME};
use crate::domain::Rejection;
use crate::error::Result;
use crate::pipeline::processing::quality_gate::ValidationCounts;

/// Writes the validation summary and the rejection list into an output directory
pub struct FileValidationOutputAdapter {
    dir: PathBuf,
}

#[derive(Serialize)]
struct RejectionRow<'a> {
    line: usize,
    stage: &'static str,
    reason: &'static str,
    detail: String,
    raw: &'a str,
}

impl FileValidationOutputAdapter {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(VALIDATION_SUMMARY_FILE_NAME)
    }

    pub fn rejections_path(&self) -> PathBuf {
        self.dir.join(REJECTIONS_FILE_NAME)
    }
}

/// Plain-text rendering of the three cleaning counters
pub fn format_summary(counts: &ValidationCounts) -> String {
    format!(
        "Validation Summary\n==================\nRecords parsed:   {}\nRecords accepted: {}\nRecords rejected: {}\n",
        counts.parsed, counts.accepted, counts.rejected
    )
}

#[async_trait]
impl ValidationOutputPort for FileValidationOutputAdapter {
    async fn write_summary(&self, counts: &ValidationCounts) -> Result<()> {
        let path = self.summary_path();
        fs::write(&path, format_summary(counts))?;
        info!("Wrote validation summary to {}", path.display());
        Ok(())
    }

    async fn write_rejections(&self, rejections: &[Rejection]) -> Result<()> {
        let path = self.rejections_path();
        let mut writer = csv::Writer::from_path(&path)?;
        if rejections.is_empty() {
            writer.write_record(["line", "stage", "reason", "detail", "raw"])?;
        }
        for rejection in rejections {
            writer.serialize(RejectionRow {
                line: rejection.line,
                stage: rejection.stage.as_str(),
                reason: rejection.reason.code(),
                detail: rejection.reason.to_string(),
                raw: &rejection.raw,
            })?;
        }
        writer.flush()?;
        info!("Wrote {} rejections to {}", rejections.len(), path.display());
        Ok(())
    }
}
