use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::ports::CleanedStorePort;
use crate::domain::RawJobRecord;
use crate::observability::metrics;
use crate::pipeline::{CleaningOutput, CleaningPipeline, MarketSummary, RunReport, RunWarning};

/// Cleans a raw batch and persists the result through the store port
pub struct CleanUseCase {
    pipeline: CleaningPipeline,
    store: Arc<dyn CleanedStorePort>,
    /// Deduplicate against everything already stored, not only this batch
    against_store: bool,
}

impl CleanUseCase {
    pub fn new(pipeline: CleaningPipeline, store: Arc<dyn CleanedStorePort>, against_store: bool) -> Self {
        Self { pipeline, store, against_store }
    }

    pub async fn execute(&self, batch: Vec<RawJobRecord>) -> Result<CleaningOutput> {
        let prior = if self.against_store {
            self.store.load_all().await.context("Failed to load cleaned store")?
        } else {
            Vec::new()
        };
        info!("Cleaning {} raw records against {} stored records", batch.len(), prior.len());

        // CPU-bound; keep it off the async workers
        let pipeline = self.pipeline.clone();
        let against_store = self.against_store;
        let output = tokio::task::spawn_blocking(move || {
            if against_store {
                pipeline.run_against(batch, prior)
            } else {
                pipeline.run(batch)
            }
        })
        .await
        .context("Cleaning task panicked")?;

        record_run_metrics(&output.report);

        match self.store.upsert(&output.records).await {
            Ok(size) => {
                metrics::store::write_success(size);
                info!("Upserted {} records, store now holds {}", output.records.len(), size);
            }
            Err(e) => {
                metrics::store::write_error();
                error!("Failed to persist cleaned records: {}", e);
                return Err(e).context("Failed to persist cleaned records");
            }
        }

        Ok(output)
    }

    /// Market summary over the whole store
    pub async fn summarize(&self) -> Result<MarketSummary> {
        let records = self.store.load_all().await.context("Failed to load cleaned store")?;
        Ok(MarketSummary::from_records(&records))
    }
}

fn record_run_metrics(report: &RunReport) {
    for (source, count) in &report.received_by_source {
        metrics::ingestion::records_received(source.as_str(), *count);
    }
    metrics::cleaning::records_unprocessable(report.unprocessable);
    metrics::cleaning::records_cleaned(report.cleaned);
    metrics::cleaning::salary_unparseable(report.salary_unparseable);
    metrics::cleaning::location_unknown(report.location_unknown);
    metrics::cleaning::job_type_unknown(report.job_type_unknown);
    metrics::cleaning::salary_imputed(report.imputed);
    metrics::cleaning::duplicates_removed(report.duplicates_removed);
    metrics::cleaning::run_duration(report.duration_secs());

    for warning in &report.warnings {
        match warning {
            RunWarning::EmptySource { source } => metrics::cleaning::empty_source(source.as_str()),
            RunWarning::ImputationUndefined { pending } => {
                warn!("Salary imputation undefined for {} records", pending)
            }
        }
    }
}
