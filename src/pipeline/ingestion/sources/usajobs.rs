use serde::Deserialize;

use super::super::{lenient_f64, parse_timestamp, string_or_number, IntoRawRecord, StagingContext};
use crate::domain::{PayPeriod, RawJobRecord, RawSalary, Source};

/// One `SearchResultItems` entry from the USAJobs search API
#[derive(Debug, Clone, Deserialize)]
pub struct UsaJobsItem {
    #[serde(rename = "MatchedObjectDescriptor")]
    pub descriptor: UsaJobsDescriptor,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UsaJobsDescriptor {
    #[serde(rename = "PositionID", deserialize_with = "string_or_number")]
    pub position_id: Option<String>,
    pub position_title: Option<String>,
    pub organization_name: Option<String>,
    pub department_name: Option<String>,
    pub position_location: Vec<UsaJobsLocation>,
    pub position_remuneration: Vec<UsaJobsRemuneration>,
    pub position_offering_type: Vec<UsaJobsOfferingType>,
    pub publication_start_date: Option<String>,
    #[serde(rename = "PositionURI")]
    pub position_uri: Option<String>,
    #[serde(rename = "ApplyURI")]
    pub apply_uri: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UsaJobsLocation {
    pub city_name: Option<String>,
    pub state_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UsaJobsRemuneration {
    #[serde(deserialize_with = "lenient_f64")]
    pub minimum_range: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub maximum_range: Option<f64>,
    /// `PA` per annum, `PH` per hour, `PW` per week, `PM` per month, others unsupported
    pub rate_interval_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UsaJobsOfferingType {
    pub name: Option<String>,
}

fn pay_period(code: &str) -> Option<PayPeriod> {
    match code.trim().to_ascii_uppercase().as_str() {
        "" | "PA" | "PER YEAR" => Some(PayPeriod::Annual),
        "PH" => Some(PayPeriod::Hourly),
        "PW" => Some(PayPeriod::Weekly),
        "PM" => Some(PayPeriod::Monthly),
        _ => None,
    }
}

/// Federal offering types expressed in the employment vocabulary the classifier reads
fn offering_descriptor(name: &str) -> String {
    match name.trim() {
        "Permanent" => "Full-time".to_string(),
        "Temporary" => "Temporary".to_string(),
        "Term" => "Contract".to_string(),
        "Intermittent" => "Part-time".to_string(),
        other => other.to_string(),
    }
}

impl UsaJobsRemuneration {
    fn to_raw_salary(&self) -> Option<RawSalary> {
        if self.minimum_range.is_none() && self.maximum_range.is_none() {
            return None;
        }
        let code = self.rate_interval_code.as_deref().unwrap_or_default();
        match pay_period(code) {
            Some(period) => Some(RawSalary::Range {
                min: self.minimum_range,
                max: self.maximum_range,
                period,
            }),
            // Keep the interval in the text so the normalizer reports it as unparseable
            None => {
                let bound = |v: Option<f64>| v.map(|v| format!("${}", v)).unwrap_or_default();
                Some(RawSalary::text(format!(
                    "{} - {} ({})",
                    bound(self.minimum_range),
                    bound(self.maximum_range),
                    code
                )))
            }
        }
    }
}

impl IntoRawRecord for UsaJobsItem {
    fn into_raw(self, ctx: &StagingContext) -> RawJobRecord {
        let d = self.descriptor;
        let mut raw = RawJobRecord::new(Source::UsaJobs, ctx.observed_at);

        let location = d.position_location.first().and_then(|loc| {
            match (loc.city_name.as_deref(), loc.state_name.as_deref()) {
                (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
                (Some(city), None) => Some(city.to_string()),
                (None, Some(state)) => Some(state.to_string()),
                (None, None) => None,
            }
        });

        raw.source_job_id = d.position_id;
        raw.title = d.position_title;
        raw.company = d.organization_name.filter(|n| !n.trim().is_empty()).or(d.department_name);
        raw.location = location;
        raw.search_location = ctx.search_location.clone();
        raw.salary = d.position_remuneration.first().and_then(UsaJobsRemuneration::to_raw_salary);
        raw.job_type = d
            .position_offering_type
            .first()
            .and_then(|o| o.name.as_deref())
            .map(offering_descriptor);
        raw.job_url = d.position_uri.or_else(|| d.apply_uri.into_iter().next());
        raw.posted_at = d.publication_start_date.as_deref().and_then(parse_timestamp);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn ctx() -> StagingContext {
        StagingContext { observed_at: Utc::now(), search_location: None }
    }

    #[test]
    fn test_usajobs_item_maps_to_raw_record() {
        let item: UsaJobsItem = serde_json::from_value(json!({
            "MatchedObjectDescriptor": {
                "PositionID": "DOE-2025-0042",
                "PositionTitle": "Statistician",
                "OrganizationName": "",
                "DepartmentName": "Department of Energy",
                "PositionLocation": [{"CityName": "Denver", "StateName": "Colorado"}],
                "PositionRemuneration": [{"MinimumRange": "45.10", "MaximumRange": "58.63", "RateIntervalCode": "PH"}],
                "PositionOfferingType": [{"Name": "Intermittent", "Code": "15328"}],
                "PublicationStartDate": "2025-11-20T00:00:00.0000",
                "PositionURI": "https://www.usajobs.gov/job/800000042"
            }
        }))
        .unwrap();

        let raw = item.into_raw(&ctx());

        assert_eq!(raw.source_job_id.as_deref(), Some("DOE-2025-0042"));
        assert_eq!(raw.company.as_deref(), Some("Department of Energy"));
        assert_eq!(raw.location.as_deref(), Some("Denver, Colorado"));
        assert_eq!(raw.job_type.as_deref(), Some("Part-time"));
        assert_eq!(
            raw.salary,
            Some(RawSalary::Range { min: Some(45.10), max: Some(58.63), period: PayPeriod::Hourly })
        );
        assert!(raw.posted_at.is_some());
    }

    #[test]
    fn test_unsupported_rate_interval_becomes_text() {
        let remuneration = UsaJobsRemuneration {
            minimum_range: Some(300.0),
            maximum_range: Some(400.0),
            rate_interval_code: Some("PD".to_string()),
        };
        assert_eq!(remuneration.to_raw_salary(), Some(RawSalary::text("$300 - $400 (PD)")));
    }
}
