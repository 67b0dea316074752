use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use job_market_cleaner::app::CleanUseCase;
use job_market_cleaner::infra::NdjsonCleanedStore;
use job_market_cleaner::observability::{self, init_logging};
use job_market_cleaner::pipeline::ingestion::load_staging_dir;
use job_market_cleaner::{CleaningPipeline, Config};

#[derive(Parser)]
#[command(name = "job_market_cleaner")]
#[command(about = "Cleans staged job postings into a deduplicated, analysis-ready store")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean every staged file and upsert the result into the store
    Clean {
        /// Directory of `<source>_<timestamp>.json` files
        #[arg(long)]
        staging_dir: Option<PathBuf>,
        /// Cleaned NDJSON store
        #[arg(long)]
        output: Option<PathBuf>,
        /// Where to write the market summary JSON
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Also write the run report JSON here
        #[arg(long)]
        report: Option<PathBuf>,
        /// Where to write a Prometheus text snapshot of the run metrics
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Rebuild the market summary from an existing store
    Summarize {
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    init_logging(&config.paths.log_dir);
    if let Err(e) = observability::init() {
        warn!("Metrics disabled: {}", e);
    }

    match cli.command {
        Commands::Clean { staging_dir, output, summary, report, metrics } => {
            let staging_dir = staging_dir.unwrap_or(config.paths.staging_dir.clone());
            let output = output.unwrap_or(config.paths.output_path.clone());
            let summary = summary.unwrap_or(config.paths.summary_path.clone());

            let load = load_staging_dir(&staging_dir)?;
            observability::metrics::ingestion::staging_files(load.files_loaded, load.skipped_files.len());
            if load.records.is_empty() {
                error!("No raw records found in {}", staging_dir.display());
                anyhow::bail!("no raw records found in {}", staging_dir.display());
            }

            let store = Arc::new(NdjsonCleanedStore::new(&output));
            let use_case = CleanUseCase::new(
                CleaningPipeline::new(config.cleaning.clone()),
                store,
                config.dedup.against_store,
            );

            let result = use_case.execute(load.records).await?;
            let run = &result.report;
            info!(
                run_id = %run.run_id,
                "Run complete: {} received, {} unprocessable, {} imputed, {} duplicates removed",
                run.received, run.unprocessable, run.imputed, run.duplicates_removed
            );
            for warning in &run.warnings {
                warn!("Run warning: {:?}", warning);
            }

            write_json(&summary, &use_case.summarize().await?)?;
            info!("Market summary written to {}", summary.display());

            if let Some(path) = report {
                write_json(&path, run)?;
            }
            if let (Some(path), Some(text)) = (metrics, observability::render()) {
                std::fs::write(&path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            run.verify()?;
            info!("Verification passed: {} cleaned records in {}", run.output_records, output.display());
        }
        Commands::Summarize { store, output } => {
            let store_path = store.unwrap_or(config.paths.output_path.clone());
            let output = output.unwrap_or(config.paths.summary_path.clone());

            let use_case = CleanUseCase::new(
                CleaningPipeline::new(config.cleaning.clone()),
                Arc::new(NdjsonCleanedStore::new(&store_path)),
                false,
            );
            let summary = use_case.summarize().await?;
            write_json(&output, &summary)?;
            info!("Summarized {} jobs into {}", summary.total_jobs, output.display());
        }
    }

    Ok(())
}
