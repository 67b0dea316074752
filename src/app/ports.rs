use async_trait::async_trait;

use crate::common::error::Result;
use crate::domain::CleanedJobRecord;

/// Persistence boundary for cleaned records
#[async_trait]
pub trait CleanedStorePort: Send + Sync {
    /// Every record accumulated so far, in store order
    async fn load_all(&self) -> Result<Vec<CleanedJobRecord>>;

    /// Insert or replace records keyed by `job_id`; returns the store size afterwards
    async fn upsert(&self, records: &[CleanedJobRecord]) -> Result<usize>;
}
