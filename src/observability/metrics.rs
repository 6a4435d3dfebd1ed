//! Metric recording for the sales pipeline
//!
//! Every counter goes through the `metrics` facade. No exporter is installed
//! by the binary, so recording is a no-op unless an embedding application
//! registers a recorder.

use std::fmt;

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    IngestLinesRead,

    // Parser
    ParserLinesParsed,
    ParserLinesRejected,

    // Quality gate
    QualityGateRecordsAccepted,
    QualityGateRecordsRejected,

    // Filter
    FilterRecordsRemoved,

    // Enrichment
    EnrichLookups,
    EnrichLookupDuration,
    EnrichMatched,
    EnrichFallbacks,

    // Reports
    ReportsWritten,

    // Whole run
    PipelineRuns,
    PipelineDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestLinesRead => "sales_ingest_lines_read_total",
            MetricName::ParserLinesParsed => "sales_parser_lines_parsed_total",
            MetricName::ParserLinesRejected => "sales_parser_lines_rejected_total",
            MetricName::QualityGateRecordsAccepted => "sales_quality_gate_records_accepted_total",
            MetricName::QualityGateRecordsRejected => "sales_quality_gate_records_rejected_total",
            MetricName::FilterRecordsRemoved => "sales_filter_records_removed_total",
            MetricName::EnrichLookups => "sales_enrich_lookups_total",
            MetricName::EnrichLookupDuration => "sales_enrich_lookup_duration_seconds",
            MetricName::EnrichMatched => "sales_enrich_matched_total",
            MetricName::EnrichFallbacks => "sales_enrich_fallbacks_total",
            MetricName::ReportsWritten => "sales_reports_written_total",
            MetricName::PipelineRuns => "sales_pipeline_runs_total",
            MetricName::PipelineDuration => "sales_pipeline_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ingestion Metrics
// ============================================================================

pub mod ingest {
    use super::MetricName;

    /// Record the number of non-blank data lines read from the input
    pub fn lines_read(count: usize) {
        ::metrics::counter!(MetricName::IngestLinesRead.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Parser Metrics
// ============================================================================

pub mod parser {
    use super::MetricName;

    pub fn line_parsed() {
        ::metrics::counter!(MetricName::ParserLinesParsed.as_str()).increment(1);
    }

    /// Record a structurally malformed line
    pub fn line_rejected(reason: &str) {
        ::metrics::counter!(MetricName::ParserLinesRejected.as_str(), "reason" => reason.to_string())
            .increment(1);
    }
}

// ============================================================================
// Quality Gate Metrics
// ============================================================================

pub mod quality_gate {
    use super::MetricName;

    /// Record that a record was accepted by the quality gate
    pub fn record_accepted() {
        ::metrics::counter!(MetricName::QualityGateRecordsAccepted.as_str()).increment(1);
    }

    /// Record a rejection from any cleaning stage
    pub fn record_rejected(stage: &str, reason: &str) {
        ::metrics::counter!(MetricName::QualityGateRecordsRejected.as_str(),
            "stage" => stage.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }
}

// ============================================================================
// Filter Metrics
// ============================================================================

pub mod filter {
    use super::MetricName;

    pub fn records_removed(filter: &str, count: usize) {
        ::metrics::counter!(MetricName::FilterRecordsRemoved.as_str(), "filter" => filter.to_string())
            .increment(count as u64);
    }
}

// ============================================================================
// Enrichment Metrics
// ============================================================================

pub mod enrich {
    use super::MetricName;

    /// Record one catalogue lookup and how long it took
    pub fn lookup(source: &str, secs: f64) {
        ::metrics::counter!(MetricName::EnrichLookups.as_str(), "source" => source.to_string()).increment(1);
        ::metrics::histogram!(MetricName::EnrichLookupDuration.as_str(), "source" => source.to_string())
            .record(secs);
    }

    pub fn matched() {
        ::metrics::counter!(MetricName::EnrichMatched.as_str()).increment(1);
    }

    /// Record that a transaction fell back to default enrichment
    pub fn fallback(reason: &str) {
        ::metrics::counter!(MetricName::EnrichFallbacks.as_str(), "reason" => reason.to_string()).increment(1);
    }
}

// ============================================================================
// Report Metrics
// ============================================================================

pub mod reports {
    use super::MetricName;

    pub fn written(report: &str) {
        ::metrics::counter!(MetricName::ReportsWritten.as_str(), "report" => report.to_string()).increment(1);
    }
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

pub mod pipeline {
    use super::MetricName;

    /// Record a finished run, labelled by command and outcome
    pub fn run_completed(command: &str, success: bool, secs: f64) {
        let outcome = if success { "success" } else { "error" };
        ::metrics::counter!(MetricName::PipelineRuns.as_str(),
            "command" => command.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str(), "command" => command.to_string())
            .record(secs);
    }
}
