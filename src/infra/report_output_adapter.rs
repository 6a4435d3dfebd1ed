use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::app::ports::ReportOutputPort;
use crate::constants::SALES_REPORT_FILE_NAME;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::report::render::render_reports;
use crate::pipeline::processing::report::{Report, ReportTable};

/// Writes one CSV per report table plus the plain-text report
pub struct FileReportOutputAdapter {
    dir: PathBuf,
}

impl FileReportOutputAdapter {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn text_report_path(&self) -> PathBuf {
        self.dir.join(SALES_REPORT_FILE_NAME)
    }

    fn write_table(&self, file_name: &str, table: &ReportTable) -> Result<()> {
        let path = self.dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl ReportOutputPort for FileReportOutputAdapter {
    async fn write_reports(&self, reports: &[Report]) -> Result<()> {
        for report in reports {
            for (index, table) in report.tables.iter().enumerate() {
                self.write_table(&report.file_name(index), table)?;
            }
            metrics::reports::written(report.kind.name());
            info!(report = report.kind.name(), tables = report.tables.len(), "Report written");
        }

        let path = self.text_report_path();
        fs::write(&path, render_reports(reports))?;
        info!("Wrote text report to {}", path.display());
        Ok(())
    }
}
