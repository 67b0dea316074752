use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::{HOURS_PER_YEAR, MONTHS_PER_YEAR, STATE_UNKNOWN, WEEKS_PER_YEAR};

/// The job boards this pipeline knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    Adzuna,
    #[serde(rename = "USAJobs")]
    UsaJobs,
    Jooble,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Adzuna, Source::UsaJobs, Source::Jooble];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Adzuna => "Adzuna",
            Source::UsaJobs => "USAJobs",
            Source::Jooble => "Jooble",
        }
    }

    /// Lowercase form used in composite job ids and staging file names
    pub fn slug(&self) -> &'static str {
        match self {
            Source::Adzuna => "adzuna",
            Source::UsaJobs => "usajobs",
            Source::Jooble => "jooble",
        }
    }

    /// Case-insensitive lookup of a source tag
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(tag) || s.slug() == tag.to_ascii_lowercase())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pay period a quoted salary refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    Hourly,
    Weekly,
    Monthly,
    Annual,
}

impl PayPeriod {
    /// Factor that converts one unit of this period into a yearly amount
    pub fn annual_multiplier(&self) -> u64 {
        match self {
            PayPeriod::Hourly => HOURS_PER_YEAR,
            PayPeriod::Weekly => WEEKS_PER_YEAR,
            PayPeriod::Monthly => MONTHS_PER_YEAR,
            PayPeriod::Annual => 1,
        }
    }
}

/// Salary information exactly as a source supplied it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSalary {
    /// Free text such as `"$150k"` or `"$25 - $30 per hour"`
    Text { text: String },
    /// Numeric bounds in a known pay period
    Range {
        min: Option<f64>,
        max: Option<f64>,
        period: PayPeriod,
    },
}

impl RawSalary {
    pub fn text(text: impl Into<String>) -> Self {
        RawSalary::Text { text: text.into() }
    }
}

/// A job posting as handed over by the ingestion boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJobRecord {
    /// Board that produced the record; `None` when the staged tag was unrecognized
    #[serde(default)]
    pub source: Option<Source>,
    /// Board-native id, unique only within its source
    #[serde(default)]
    pub source_job_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Location the collector searched for when it found this posting
    #[serde(default)]
    pub search_location: Option<String>,
    #[serde(default)]
    pub salary: Option<RawSalary>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    /// When the collector saw this posting
    pub observed_at: DateTime<Utc>,
}

impl RawJobRecord {
    /// Empty record for a source, observed at the given instant
    pub fn new(source: Source, observed_at: DateTime<Utc>) -> Self {
        Self {
            source: Some(source),
            source_job_id: None,
            title: None,
            company: None,
            location: None,
            search_location: None,
            salary: None,
            job_type: None,
            job_url: None,
            posted_at: None,
            observed_at,
        }
    }
}

/// Closed set of employment categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    Contract,
    #[serde(rename = "Part-time")]
    PartTime,
    Temporary,
    Internship,
    Unknown,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::Contract => "Contract",
            JobType::PartTime => "Part-time",
            JobType::Temporary => "Temporary",
            JobType::Internship => "Internship",
            JobType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical, deduplicated posting produced by the cleaning pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedJobRecord {
    /// Cross-source key: `<source>:<native id>` or `<source>:fp:<fingerprint>`
    pub job_id: String,
    pub source: Source,
    pub source_job_id: Option<String>,
    pub title: String,
    pub company: Option<String>,
    /// Raw location text kept for lineage
    pub location: Option<String>,
    pub city: Option<String>,
    /// Two-letter USPS code or `"Unknown"`
    pub state_code: String,
    pub salary_min_annual: Option<u64>,
    pub salary_max_annual: Option<u64>,
    pub salary_imputed: bool,
    pub job_type: JobType,
    pub job_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

impl CleanedJobRecord {
    pub fn has_known_state(&self) -> bool {
        self.state_code != STATE_UNKNOWN
    }

    /// Midpoint of the annual range when both bounds are present, whichever order they are stored in
    pub fn salary_midpoint(&self) -> Option<u64> {
        match (self.salary_min_annual, self.salary_max_annual) {
            (Some(a), Some(b)) => {
                let (low, high) = (a.min(b), a.max(b));
                Some(low + (high - low) / 2)
            }
            _ => None,
        }
    }
}
