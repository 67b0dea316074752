use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::common::constants::SUMMARY_TOP_N;
use crate::domain::{CleanedJobRecord, JobType, Source};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

/// Market aggregate over the cleaned store, written for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub generated_at: DateTime<Utc>,
    pub total_jobs: usize,
    pub jobs_with_salary: usize,
    /// Records whose location resolved to no US state
    pub unknown_state: usize,
    pub by_state: BTreeMap<String, usize>,
    pub by_source: BTreeMap<Source, usize>,
    pub by_job_type: BTreeMap<JobType, usize>,
    pub job_type_by_source: BTreeMap<Source, BTreeMap<JobType, usize>>,
    /// Mean salary midpoint, whole dollars
    pub avg_salary_by_state: BTreeMap<String, u64>,
    pub avg_salary_by_source: BTreeMap<Source, u64>,
    pub top_companies: Vec<NamedCount>,
    pub top_titles: Vec<NamedCount>,
}

#[derive(Default)]
struct Mean {
    sum: u128,
    count: u64,
}

impl Mean {
    fn add(&mut self, value: u64) {
        self.sum += value as u128;
        self.count += 1;
    }

    fn value(&self) -> u64 {
        (self.sum as f64 / self.count as f64).round() as u64
    }
}

impl MarketSummary {
    pub fn from_records(records: &[CleanedJobRecord]) -> Self {
        let mut summary = MarketSummary {
            generated_at: Utc::now(),
            total_jobs: records.len(),
            jobs_with_salary: 0,
            unknown_state: 0,
            by_state: BTreeMap::new(),
            by_source: BTreeMap::new(),
            by_job_type: BTreeMap::new(),
            job_type_by_source: BTreeMap::new(),
            avg_salary_by_state: BTreeMap::new(),
            avg_salary_by_source: BTreeMap::new(),
            top_companies: Vec::new(),
            top_titles: Vec::new(),
        };

        let mut state_salary: BTreeMap<&str, Mean> = BTreeMap::new();
        let mut source_salary: BTreeMap<Source, Mean> = BTreeMap::new();
        let mut companies: HashMap<&str, usize> = HashMap::new();
        let mut titles: HashMap<&str, usize> = HashMap::new();

        for record in records {
            *summary.by_source.entry(record.source).or_default() += 1;
            *summary.by_job_type.entry(record.job_type).or_default() += 1;
            *summary
                .job_type_by_source
                .entry(record.source)
                .or_default()
                .entry(record.job_type)
                .or_default() += 1;

            let midpoint = record.salary_midpoint();
            if let Some(midpoint) = midpoint {
                summary.jobs_with_salary += 1;
                source_salary.entry(record.source).or_default().add(midpoint);
            }

            if record.has_known_state() {
                *summary.by_state.entry(record.state_code.clone()).or_default() += 1;
                if let Some(midpoint) = midpoint {
                    state_salary.entry(record.state_code.as_str()).or_default().add(midpoint);
                }
            } else {
                summary.unknown_state += 1;
            }

            if let Some(company) = record.company.as_deref() {
                *companies.entry(company).or_default() += 1;
            }
            if !record.title.is_empty() {
                *titles.entry(record.title.as_str()).or_default() += 1;
            }
        }

        summary.avg_salary_by_state = state_salary
            .into_iter()
            .map(|(state, mean)| (state.to_string(), mean.value()))
            .collect();
        summary.avg_salary_by_source = source_salary
            .into_iter()
            .map(|(source, mean)| (source, mean.value()))
            .collect();
        summary.top_companies = top_n(companies, SUMMARY_TOP_N);
        summary.top_titles = top_n(titles, SUMMARY_TOP_N);
        summary
    }
}

/// Highest counts first, ties broken alphabetically
fn top_n(counts: HashMap<&str, usize>, n: usize) -> Vec<NamedCount> {
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name: name.to_string(), count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, source: Source, state: &str, company: &str, salary: Option<(u64, u64)>) -> CleanedJobRecord {
        CleanedJobRecord {
            job_id: id.to_string(),
            source,
            source_job_id: Some(id.to_string()),
            title: "Data Engineer".to_string(),
            company: Some(company.to_string()),
            location: None,
            city: None,
            state_code: state.to_string(),
            salary_min_annual: salary.map(|s| s.0),
            salary_max_annual: salary.map(|s| s.1),
            salary_imputed: false,
            job_type: JobType::FullTime,
            job_url: None,
            posted_at: None,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_aggregates() {
        let records = vec![
            record("a", Source::Adzuna, "TX", "Acme", Some((80_000, 100_000))),
            record("b", Source::Adzuna, "TX", "Acme", Some((100_000, 120_000))),
            record("c", Source::Jooble, "CA", "Initech", None),
            record("d", Source::UsaJobs, "Unknown", "Department of Energy", Some((60_000, 60_000))),
        ];

        let summary = MarketSummary::from_records(&records);

        assert_eq!(summary.total_jobs, 4);
        assert_eq!(summary.jobs_with_salary, 3);
        assert_eq!(summary.unknown_state, 1);
        assert_eq!(summary.by_state.get("TX"), Some(&2));
        assert!(!summary.by_state.contains_key("Unknown"));
        assert_eq!(summary.avg_salary_by_state.get("TX"), Some(&100_000));
        assert_eq!(summary.avg_salary_by_source.get(&Source::UsaJobs), Some(&60_000));
        assert_eq!(summary.top_companies[0], NamedCount { name: "Acme".to_string(), count: 2 });
        assert_eq!(summary.job_type_by_source[&Source::Adzuna][&JobType::FullTime], 2);
    }

    #[test]
    fn test_summary_serializes_with_readable_keys() {
        let summary = MarketSummary::from_records(&[record("a", Source::UsaJobs, "DC", "GSA", None)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["by_source"]["USAJobs"], 1);
        assert_eq!(json["by_job_type"]["Full-time"], 1);
    }

    #[test]
    fn test_top_n_ties_are_alphabetical() {
        let counts = HashMap::from([("b", 1), ("a", 1), ("c", 3)]);
        let top = top_n(counts, 2);
        assert_eq!(top.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(), vec!["c", "a"]);
    }
}
