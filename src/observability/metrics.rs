//! Run metrics for the cleaning pipeline
//!
//! Metric names live in [`MetricName`]; each pipeline phase records through
//! its own submodule. Recording is a no-op until [`init`] installs the
//! Prometheus recorder.

use std::fmt;
use std::sync::OnceLock;
use tracing::info;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    StagingFilesLoaded,
    StagingFilesSkipped,
    RecordsReceived,

    // Cleaning
    RecordsUnprocessable,
    RecordsCleaned,
    SalaryUnparseable,
    LocationUnknown,
    JobTypeUnknown,
    SalaryImputed,
    DuplicatesRemoved,
    EmptySources,
    RunDuration,

    // Store
    StoreWritesSuccess,
    StoreWritesError,
    StoreRecords,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::StagingFilesLoaded => "jmc_staging_files_loaded_total",
            MetricName::StagingFilesSkipped => "jmc_staging_files_skipped_total",
            MetricName::RecordsReceived => "jmc_records_received_total",

            MetricName::RecordsUnprocessable => "jmc_records_unprocessable_total",
            MetricName::RecordsCleaned => "jmc_records_cleaned_total",
            MetricName::SalaryUnparseable => "jmc_salary_unparseable_total",
            MetricName::LocationUnknown => "jmc_location_unknown_total",
            MetricName::JobTypeUnknown => "jmc_job_type_unknown_total",
            MetricName::SalaryImputed => "jmc_salary_imputed_total",
            MetricName::DuplicatesRemoved => "jmc_duplicates_removed_total",
            MetricName::EmptySources => "jmc_empty_sources_total",
            MetricName::RunDuration => "jmc_run_duration_seconds",

            MetricName::StoreWritesSuccess => "jmc_store_writes_success_total",
            MetricName::StoreWritesError => "jmc_store_writes_error_total",
            MetricName::StoreRecords => "jmc_store_records",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Prometheus text snapshot of everything recorded so far
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod ingestion {
    use super::MetricName;

    pub fn staging_files(loaded: usize, skipped: usize) {
        ::metrics::counter!(MetricName::StagingFilesLoaded.as_str()).increment(loaded as u64);
        ::metrics::counter!(MetricName::StagingFilesSkipped.as_str()).increment(skipped as u64);
    }

    pub fn records_received(source: &str, count: usize) {
        ::metrics::counter!(MetricName::RecordsReceived.as_str(), "source" => source.to_string())
            .increment(count as u64);
    }
}

pub mod cleaning {
    use super::MetricName;

    pub fn records_unprocessable(count: usize) {
        ::metrics::counter!(MetricName::RecordsUnprocessable.as_str()).increment(count as u64);
    }

    pub fn records_cleaned(count: usize) {
        ::metrics::counter!(MetricName::RecordsCleaned.as_str()).increment(count as u64);
    }

    pub fn salary_unparseable(count: usize) {
        ::metrics::counter!(MetricName::SalaryUnparseable.as_str()).increment(count as u64);
    }

    pub fn location_unknown(count: usize) {
        ::metrics::counter!(MetricName::LocationUnknown.as_str()).increment(count as u64);
    }

    pub fn job_type_unknown(count: usize) {
        ::metrics::counter!(MetricName::JobTypeUnknown.as_str()).increment(count as u64);
    }

    pub fn salary_imputed(count: usize) {
        ::metrics::counter!(MetricName::SalaryImputed.as_str()).increment(count as u64);
    }

    pub fn duplicates_removed(count: usize) {
        ::metrics::counter!(MetricName::DuplicatesRemoved.as_str()).increment(count as u64);
    }

    pub fn empty_source(source: &str) {
        ::metrics::counter!(MetricName::EmptySources.as_str(), "source" => source.to_string()).increment(1);
    }

    pub fn run_duration(secs: f64) {
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }
}

pub mod store {
    use super::MetricName;

    pub fn write_success(records: usize) {
        ::metrics::counter!(MetricName::StoreWritesSuccess.as_str()).increment(1);
        ::metrics::gauge!(MetricName::StoreRecords.as_str()).set(records as f64);
    }

    pub fn write_error() {
        ::metrics::counter!(MetricName::StoreWritesError.as_str()).increment(1);
    }
}
