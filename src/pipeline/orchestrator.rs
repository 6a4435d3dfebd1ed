use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::app::ports::{
    EnrichOutputPort, ProductLookupPort, ReportOutputPort, ValidationOutputPort,
};
use crate::config::{Config, EnrichmentConfig, LookupSource};
use crate::constants::{ENRICHED_FILE_NAME, RUN_LOG_FILE_NAME};
use crate::domain::Schema;
use crate::error::Result;
use crate::infra::{
    FileEnrichOutputAdapter, FileReportOutputAdapter, FileValidationOutputAdapter, HttpProductLookup,
    LocalCatalogLookup,
};
use crate::observability::metrics;
use crate::pipeline::ingestion::{self, SourceLine};
use crate::pipeline::processing::aggregate::SalesAggregator;
use crate::pipeline::processing::enrich::Enricher;
use crate::pipeline::processing::filter::{FilterSummary, TransactionFilter};
use crate::pipeline::processing::normalize::{DateNormalizer, FieldNormalizer, Normalizer};
use crate::pipeline::processing::parser::{MetricsParser, Parser, PipeDelimitedParser};
use crate::pipeline::processing::quality_gate::{
    DefaultQualityGate, QualityGate, ValidationCounts, ValidationOutcome,
};
use crate::pipeline::processing::report::ReportBuilder;
use crate::run_log::{append_run_log, RunLogEntry};

/// What a full run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub counts: ValidationCounts,
    pub filter: FilterSummary,
    pub enriched: usize,
    pub matched: usize,
    pub reports: usize,
    pub output_dir: PathBuf,
}

/// Runs the stages in order over one input file
pub struct Pipeline {
    config: Config,
    schema: Schema,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let schema = Schema::for_layout(config.input.layout);
        Self { config, schema }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the product lookup selected by `enrichment.source`
    pub fn lookup_from_config(config: &EnrichmentConfig) -> Result<Box<dyn ProductLookupPort>> {
        match config.source {
            LookupSource::Http => Ok(Box::new(HttpProductLookup::new(
                &config.base_url,
                Duration::from_millis(config.timeout_ms),
            )?)),
            LookupSource::Offline => match &config.catalog_path {
                Some(path) => Ok(Box::new(LocalCatalogLookup::from_file(path)?)),
                None => {
                    warn!("Offline enrichment without a catalogue; every product falls back");
                    Ok(Box::new(LocalCatalogLookup::empty()))
                }
            },
        }
    }

    /// Parse, normalize and validate already-read lines
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn clean_lines(&self, lines: &[SourceLine]) -> ValidationOutcome {
        let parser = MetricsParser::new(PipeDelimitedParser::new(self.schema.clone()));
        let normalizer = FieldNormalizer::new(
            self.schema.clone(),
            DateNormalizer::new(self.config.input.date_formats.clone()),
        );
        let gate = DefaultQualityGate::with_config(self.schema.clone(), self.config.validation.clone());

        let candidates = parser
            .parse_all(lines)
            .into_iter()
            .map(|parsed| parsed.and_then(|record| normalizer.normalize(&record)))
            .collect();
        gate.assess_batch(candidates)
    }

    /// Cleaning stage only: read, clean, and write the validation artifacts
    #[instrument(skip_all, fields(input = %self.config.input.path.display()))]
    pub async fn clean(&self) -> Result<ValidationOutcome> {
        let started = Instant::now();
        let result = self.clean_and_record().await;
        metrics::pipeline::run_completed("clean", result.is_ok(), started.elapsed().as_secs_f64());
        result
    }

    async fn clean_and_record(&self) -> Result<ValidationOutcome> {
        let lines = ingestion::read_sales_data(&self.config.input.path, self.config.input.has_header)?;
        let outcome = self.clean_lines(&lines);

        let output: Box<dyn ValidationOutputPort> =
            Box::new(FileValidationOutputAdapter::new(&self.config.output.dir)?);
        output.write_summary(&outcome.counts).await?;
        output.write_rejections(&outcome.rejections).await?;
        Ok(outcome)
    }

    /// Full run. The outcome, success or failure, is appended to the run log.
    #[instrument(skip_all, fields(input = %self.config.input.path.display(), source = lookup.name()))]
    pub async fn run(&self, filter: TransactionFilter, lookup: Box<dyn ProductLookupPort>) -> Result<RunSummary> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting pipeline run");

        let result = self.run_stages(run_id, &filter, lookup).await;

        let entry = match &result {
            Ok(summary) => RunLogEntry::new(run_id, &filter, Ok(summary)),
            Err(e) => {
                error!("Pipeline run failed: {}", e);
                RunLogEntry::new(run_id, &filter, Err(e.to_string()))
            }
        };
        let log_path = self.config.output.dir.join(RUN_LOG_FILE_NAME);
        if let Err(e) = append_run_log(&log_path, &entry) {
            warn!("Failed to append run log {}: {}", log_path.display(), e);
        }

        let elapsed = started.elapsed();
        metrics::pipeline::run_completed("run", result.is_ok(), elapsed.as_secs_f64());
        info!(%run_id, elapsed_ms = elapsed.as_millis() as u64, "Pipeline run finished");
        result
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        filter: &TransactionFilter,
        lookup: Box<dyn ProductLookupPort>,
    ) -> Result<RunSummary> {
        let output_dir = &self.config.output.dir;

        // Clean
        let outcome = self.clean_and_record().await?;

        // Filter
        let (retained, filter_summary) = filter.apply(outcome.valid);

        // Enrich
        let enricher = Enricher::new(lookup, &self.config.enrichment);
        let enriched = enricher.enrich_all(retained).await;
        let enrich_output: Box<dyn EnrichOutputPort> =
            Box::new(FileEnrichOutputAdapter::new(&output_dir.join(ENRICHED_FILE_NAME))?);
        enrich_output.write_enriched(&self.schema, &enriched).await?;

        // Aggregate and report
        let aggregates = SalesAggregator::with_config(&self.config.reports).aggregate(&enriched);
        let reports = ReportBuilder::new().build_all(&aggregates);
        let report_output: Box<dyn ReportOutputPort> = Box::new(FileReportOutputAdapter::new(output_dir)?);
        report_output.write_reports(&reports).await?;

        Ok(RunSummary {
            run_id,
            counts: outcome.counts,
            filter: filter_summary,
            enriched: enriched.len(),
            matched: aggregates.enrichment.matched,
            reports: reports.len(),
            output_dir: output_dir.clone(),
        })
    }
}
