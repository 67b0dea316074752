pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod summary;

pub use orchestrator::{CleaningOutput, CleaningPipeline, RunReport, RunWarning};
pub use summary::MarketSummary;
