use serde::Deserialize;

use super::super::{parse_timestamp, string_or_number, IntoRawRecord, StagingContext};
use crate::domain::{RawJobRecord, RawSalary, Source};

/// One entry of the `jobs` array returned by the Jooble API
#[derive(Debug, Clone, Deserialize)]
pub struct JoobleJob {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Free text, e.g. `"$50k - $70k"` or `"$25 per hour"`
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default, rename = "type")]
    pub job_type: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl IntoRawRecord for JoobleJob {
    fn into_raw(self, ctx: &StagingContext) -> RawJobRecord {
        let mut raw = RawJobRecord::new(Source::Jooble, ctx.observed_at);
        raw.source_job_id = self.id;
        raw.title = self.title;
        raw.company = self.company;
        raw.location = self.location;
        raw.search_location = ctx.search_location.clone();
        raw.salary = self.salary.map(RawSalary::text);
        raw.job_type = self.job_type;
        raw.job_url = self.link;
        raw.posted_at = self.updated.as_deref().and_then(parse_timestamp);
        raw
    }
}
