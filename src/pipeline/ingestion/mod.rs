//! Staging-area ingestion
//!
//! Collectors drop one JSON file per source run into the staging directory,
//! named `<source>_<YYYYmmdd_HHMMSS>.json`. A file holds either a bare array
//! of the source's native records or an envelope
//! `{"search_location": "TX", "results": [...]}`. Each native shape is
//! adapted into a [`RawJobRecord`] here; nothing downstream sees source
//! specific fields.

pub mod sources;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::common::constants::STAGING_TIMESTAMP_FORMAT;
use crate::common::error::{CleanerError, Result};
use crate::domain::{RawJobRecord, Source};
use sources::{AdzunaJob, JoobleJob, UsaJobsItem};

/// Context shared by every record of one staged file
#[derive(Debug, Clone)]
pub struct StagingContext {
    pub observed_at: DateTime<Utc>,
    /// Search area the collector queried, e.g. `TX`
    pub search_location: Option<String>,
}

/// Adapter from a source's native record shape to the common raw record
pub trait IntoRawRecord {
    fn into_raw(self, ctx: &StagingContext) -> RawJobRecord;
}

/// Native records of one staged file
#[derive(Debug, Clone)]
pub enum SourcePayload {
    Adzuna(Vec<AdzunaJob>),
    UsaJobs(Vec<UsaJobsItem>),
    Jooble(Vec<JoobleJob>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StagedDocument<T> {
    Envelope {
        #[serde(default)]
        search_location: Option<String>,
        results: Vec<T>,
    },
    Items(Vec<T>),
}

fn read_document<T: DeserializeOwned>(content: &str) -> serde_json::Result<(Vec<T>, Option<String>)> {
    Ok(match serde_json::from_str::<StagedDocument<T>>(content)? {
        StagedDocument::Envelope { search_location, results } => (results, search_location),
        StagedDocument::Items(items) => (items, None),
    })
}

/// One parsed staging file
#[derive(Debug, Clone)]
pub struct StagedBatch {
    pub payload: SourcePayload,
    pub search_location: Option<String>,
}

impl StagedBatch {
    pub fn from_json(source: Source, content: &str) -> Result<Self> {
        let (payload, search_location) = match source {
            Source::Adzuna => {
                let (items, loc) = read_document(content)?;
                (SourcePayload::Adzuna(items), loc)
            }
            Source::UsaJobs => {
                let (items, loc) = read_document(content)?;
                (SourcePayload::UsaJobs(items), loc)
            }
            Source::Jooble => {
                let (items, loc) = read_document(content)?;
                (SourcePayload::Jooble(items), loc)
            }
        };
        Ok(Self { payload, search_location })
    }

    pub fn len(&self) -> usize {
        match &self.payload {
            SourcePayload::Adzuna(items) => items.len(),
            SourcePayload::UsaJobs(items) => items.len(),
            SourcePayload::Jooble(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_raw_records(self, observed_at: DateTime<Utc>) -> Vec<RawJobRecord> {
        let ctx = StagingContext { observed_at, search_location: self.search_location };
        match self.payload {
            SourcePayload::Adzuna(items) => adapt_all(items, &ctx),
            SourcePayload::UsaJobs(items) => adapt_all(items, &ctx),
            SourcePayload::Jooble(items) => adapt_all(items, &ctx),
        }
    }
}

fn adapt_all<T: IntoRawRecord>(items: Vec<T>, ctx: &StagingContext) -> Vec<RawJobRecord> {
    items.into_iter().map(|item| item.into_raw(ctx)).collect()
}

/// Everything read from one pass over the staging directory
#[derive(Debug, Clone, Default)]
pub struct StagingLoad {
    pub records: Vec<RawJobRecord>,
    pub files_loaded: usize,
    /// Files that could not be attributed to a source or parsed
    pub skipped_files: Vec<PathBuf>,
}

/// Source and observation time encoded in a staging file name
pub fn parse_staging_file_name(path: &Path) -> Option<(Source, Option<DateTime<Utc>>)> {
    let stem = path.file_stem()?.to_str()?;
    let (prefix, stamp) = match stem.split_once('_') {
        Some((prefix, stamp)) => (prefix, Some(stamp)),
        None => (stem, None),
    };
    let source = Source::parse(prefix)?;
    let observed_at = stamp
        .and_then(|s| NaiveDateTime::parse_from_str(s, STAGING_TIMESTAMP_FORMAT).ok())
        .map(|naive| naive.and_utc());
    Some((source, observed_at))
}

/// Read every `*.json` file in `dir`, in file-name order.
///
/// An unreadable directory is an error. A file that cannot be attributed or
/// parsed is logged and skipped so the remaining sources still load.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_staging_dir(dir: &Path) -> Result<StagingLoad> {
    let entries = fs::read_dir(dir).map_err(|e| CleanerError::Staging {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut load = StagingLoad::default();
    for path in paths {
        match load_staging_file(&path) {
            Ok(records) => {
                debug!("Loaded {} records from {}", records.len(), path.display());
                load.records.extend(records);
                load.files_loaded += 1;
            }
            Err(e) => {
                warn!("Skipping staging file {}: {}", path.display(), e);
                load.skipped_files.push(path);
            }
        }
    }

    info!(
        "Loaded {} raw records from {} staging files ({} skipped)",
        load.records.len(),
        load.files_loaded,
        load.skipped_files.len()
    );
    Ok(load)
}

/// Read one staging file into raw records
pub fn load_staging_file(path: &Path) -> Result<Vec<RawJobRecord>> {
    let (source, stamped_at) = parse_staging_file_name(path).ok_or_else(|| CleanerError::Staging {
        path: path.to_path_buf(),
        message: "file name does not start with a known source".to_string(),
    })?;

    let content = fs::read_to_string(path)?;
    let batch = StagedBatch::from_json(source, &content)?;
    if batch.is_empty() {
        debug!("{} staging file {} holds no records", source, path.display());
    }

    let observed_at = stamped_at
        .or_else(|| fs::metadata(path).and_then(|m| m.modified()).ok().map(DateTime::<Utc>::from))
        .unwrap_or_else(Utc::now);
    Ok(batch.into_raw_records(observed_at))
}

/// Parse the timestamp formats the job boards publish
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Accept an identifier written either as a JSON string or a number
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept an amount written either as a JSON number or a numeric string
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}
