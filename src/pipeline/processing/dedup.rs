use std::collections::HashMap;
use tracing::debug;

use crate::domain::CleanedJobRecord;

/// A batch with one record per `job_id`
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub records: Vec<CleanedJobRecord>,
    /// Records dropped because another instance of the same `job_id` was kept
    pub removed: usize,
}

/// Collapse records sharing a `job_id`.
///
/// Scans in order. A later duplicate replaces the kept instance only when it
/// was observed strictly more recently; on equal timestamps the first one
/// encountered stays. Survivors keep the position of their first appearance.
pub fn deduplicate<I>(records: I) -> DedupOutcome
where
    I: IntoIterator<Item = CleanedJobRecord>,
{
    let mut kept: Vec<CleanedJobRecord> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut removed = 0;

    for record in records {
        match index_by_id.get(&record.job_id) {
            Some(&idx) => {
                removed += 1;
                if record.observed_at > kept[idx].observed_at {
                    debug!(job_id = %record.job_id, "Replacing duplicate with more recent observation");
                    kept[idx] = record;
                } else {
                    debug!(job_id = %record.job_id, "Dropping duplicate");
                }
            }
            None => {
                index_by_id.insert(record.job_id.clone(), kept.len());
                kept.push(record);
            }
        }
    }

    DedupOutcome { records: kept, removed }
}

/// Deduplicate a fresh batch against records already accumulated in the store.
/// Stored records are scanned first, so they win ties against the new batch.
pub fn deduplicate_against(prior: Vec<CleanedJobRecord>, batch: Vec<CleanedJobRecord>) -> DedupOutcome {
    deduplicate(prior.into_iter().chain(batch))
}
