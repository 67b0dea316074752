pub mod common;
pub mod config;
pub mod domain;
pub mod observability;
pub mod pipeline;

// Application use cases and the adapters behind their ports
pub mod app;
pub mod infra;

pub use common::error::{CleanerError, Result};
pub use config::Config;
pub use domain::{CleanedJobRecord, JobType, RawJobRecord, Source};
pub use pipeline::{CleaningOutput, CleaningPipeline, MarketSummary, RunReport, RunWarning};
