use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::app::ports::CleanedStorePort;
use crate::common::error::{CleanerError, Result};
use crate::domain::CleanedJobRecord;

/// Replace records sharing a `job_id` in place and append the rest
fn merge(mut existing: Vec<CleanedJobRecord>, incoming: &[CleanedJobRecord]) -> Vec<CleanedJobRecord> {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, r)| (r.job_id.clone(), i))
        .collect();
    for record in incoming {
        match index.get(&record.job_id) {
            Some(&i) => existing[i] = record.clone(),
            None => {
                index.insert(record.job_id.clone(), existing.len());
                existing.push(record.clone());
            }
        }
    }
    existing
}

/// Cleaned store kept as one JSON record per line
pub struct NdjsonCleanedStore {
    path: PathBuf,
}

impl NdjsonCleanedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn write_all(&self, records: &[CleanedJobRecord]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }

        // Write beside the store and rename so readers never see a partial file
        let tmp = self.path.with_extension("ndjson.tmp");
        fs::write(&tmp, buf).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CleanedStorePort for NdjsonCleanedStore {
    async fn load_all(&self) -> Result<Vec<CleanedJobRecord>> {
        if !fs::try_exists(&self.path).await? {
            debug!("No cleaned store at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    CleanerError::Store(format!("{} line {}: {}", self.path.display(), n + 1, e))
                })
            })
            .collect()
    }

    async fn upsert(&self, records: &[CleanedJobRecord]) -> Result<usize> {
        let merged = merge(self.load_all().await?, records);
        self.write_all(&merged).await?;
        info!("Wrote {} records to {}", merged.len(), self.path.display());
        Ok(merged.len())
    }
}

/// Store used by tests and dry runs
#[derive(Default)]
pub struct InMemoryCleanedStore {
    records: Mutex<Vec<CleanedJobRecord>>,
}

#[async_trait]
impl CleanedStorePort for InMemoryCleanedStore {
    async fn load_all(&self) -> Result<Vec<CleanedJobRecord>> {
        Ok(self.records.lock().await.clone())
    }

    async fn upsert(&self, records: &[CleanedJobRecord]) -> Result<usize> {
        let mut guard = self.records.lock().await;
        let merged = merge(std::mem::take(&mut *guard), records);
        *guard = merged;
        Ok(guard.len())
    }
}
