use serde::Deserialize;

use super::super::{lenient_f64, parse_timestamp, string_or_number, IntoRawRecord, StagingContext};
use crate::domain::{PayPeriod, RawJobRecord, RawSalary, Source};

/// One result from the Adzuna search API
#[derive(Debug, Clone, Deserialize)]
pub struct AdzunaJob {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<AdzunaCompany>,
    #[serde(default)]
    pub location: Option<AdzunaLocation>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub salary_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub salary_max: Option<f64>,
    /// `permanent` or `contract`
    #[serde(default)]
    pub contract_type: Option<String>,
    /// `full_time` or `part_time`
    #[serde(default)]
    pub contract_time: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdzunaCompany {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdzunaLocation {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Administrative areas from country down to city, e.g. `["US", "Texas", "Harris County", "Houston"]`
    #[serde(default)]
    pub area: Vec<String>,
}

impl AdzunaLocation {
    fn to_text(&self) -> Option<String> {
        if let Some(name) = self.display_name.as_ref().filter(|n| !n.trim().is_empty()) {
            return Some(name.clone());
        }
        match self.area.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            [_, state] => Some(state.clone()),
            [_, state, .., city] => Some(format!("{}, {}", city, state)),
        }
    }
}

impl IntoRawRecord for AdzunaJob {
    fn into_raw(self, ctx: &StagingContext) -> RawJobRecord {
        let mut raw = RawJobRecord::new(Source::Adzuna, ctx.observed_at);

        let salary = match (self.salary_min, self.salary_max) {
            (None, None) => None,
            (min, max) => Some(RawSalary::Range { min, max, period: PayPeriod::Annual }),
        };
        let job_type = [self.contract_type, self.contract_time]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        raw.source_job_id = self.id;
        raw.title = self.title;
        raw.company = self.company.and_then(|c| c.display_name);
        raw.location = self.location.as_ref().and_then(AdzunaLocation::to_text);
        raw.search_location = ctx.search_location.clone();
        raw.salary = salary;
        raw.job_type = (!job_type.is_empty()).then(|| job_type.join(" "));
        raw.job_url = self.redirect_url;
        raw.posted_at = self.created.as_deref().and_then(parse_timestamp);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_adzuna_result_maps_to_raw_record() {
        let job: AdzunaJob = serde_json::from_value(json!({
            "id": 4_712_345_678u64,
            "title": "Data Scientist",
            "company": {"display_name": "Acme Analytics"},
            "location": {"display_name": "Houston, Harris County", "area": ["US", "Texas", "Harris County", "Houston"]},
            "salary_min": 95000,
            "contract_type": "permanent",
            "contract_time": "full_time",
            "created": "2025-12-01T08:15:00Z",
            "redirect_url": "https://www.adzuna.com/land/ad/4712345678"
        }))
        .unwrap();

        let ctx = StagingContext { observed_at: Utc::now(), search_location: Some("TX".to_string()) };
        let raw = job.into_raw(&ctx);

        assert_eq!(raw.source, Some(Source::Adzuna));
        assert_eq!(raw.source_job_id.as_deref(), Some("4712345678"));
        assert_eq!(raw.company.as_deref(), Some("Acme Analytics"));
        assert_eq!(raw.job_type.as_deref(), Some("permanent full_time"));
        assert_eq!(raw.search_location.as_deref(), Some("TX"));
        assert_eq!(
            raw.salary,
            Some(RawSalary::Range { min: Some(95000.0), max: None, period: PayPeriod::Annual })
        );
        assert!(raw.posted_at.is_some());
    }

    #[test]
    fn test_area_is_used_without_display_name() {
        let location = AdzunaLocation {
            display_name: None,
            area: vec!["US".into(), "Texas".into(), "Harris County".into(), "Houston".into()],
        };
        assert_eq!(location.to_text().as_deref(), Some("Houston, Texas"));
    }
}
