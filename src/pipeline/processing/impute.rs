use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::domain::{CleanedJobRecord, Source};

/// Population the median spread is computed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadScope {
    /// One median across the whole batch
    #[default]
    Global,
    /// One median per source, falling back to the batch median
    PerSource,
}

/// What the imputer did to a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputationOutcome {
    /// Batch-wide median of `max - min`, if any record had both bounds
    pub median_spread: Option<u64>,
    /// Records whose max was filled
    pub imputed: usize,
    /// Records that needed a max but had no spread to draw from
    pub skipped: usize,
}

impl ImputationOutcome {
    /// True when records needed imputation and no spread existed for them
    pub fn is_undefined(&self) -> bool {
        self.skipped > 0
    }
}

/// Median of a set of values, rounding a half-way even median up
pub fn median(values: &mut [u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let (low, high) = (values[mid - 1], values[mid]);
        Some(low + (high - low + 1) / 2)
    }
}

/// Fill missing salary ceilings from the batch's median spread.
///
/// Spreads are gathered in a read-only pass over every record with both
/// bounds; only then are records with a floor and no ceiling filled.
pub fn impute_salary_max(records: &mut [CleanedJobRecord], scope: SpreadScope) -> ImputationOutcome {
    let mut all_spreads = Vec::new();
    let mut spreads_by_source: HashMap<Source, Vec<u64>> = HashMap::new();
    for record in records.iter() {
        if let (Some(min), Some(max)) = (record.salary_min_annual, record.salary_max_annual) {
            let spread = max.saturating_sub(min);
            all_spreads.push(spread);
            spreads_by_source.entry(record.source).or_default().push(spread);
        }
    }

    let median_spread = median(&mut all_spreads);
    let source_medians: HashMap<Source, u64> = match scope {
        SpreadScope::Global => HashMap::new(),
        SpreadScope::PerSource => spreads_by_source
            .into_iter()
            .filter_map(|(source, mut spreads)| median(&mut spreads).map(|m| (source, m)))
            .collect(),
    };

    let mut outcome = ImputationOutcome { median_spread, ..Default::default() };
    for record in records.iter_mut() {
        let Some(min) = record.salary_min_annual else { continue };
        if record.salary_max_annual.is_some() {
            continue;
        }

        let spread = source_medians.get(&record.source).copied().or(median_spread);
        match spread {
            Some(spread) => {
                record.salary_max_annual = Some(min.saturating_add(spread));
                record.salary_imputed = true;
                outcome.imputed += 1;
                debug!(job_id = %record.job_id, spread, "Imputed salary max");
            }
            None => outcome.skipped += 1,
        }
    }

    if outcome.is_undefined() {
        warn!(
            "No records with both salary bounds; {} salary ceilings left empty",
            outcome.skipped
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobType;
    use chrono::Utc;

    fn record(id: &str, source: Source, min: Option<u64>, max: Option<u64>) -> CleanedJobRecord {
        CleanedJobRecord {
            job_id: id.to_string(),
            source,
            source_job_id: Some(id.to_string()),
            title: "Data Scientist".to_string(),
            company: None,
            location: None,
            city: None,
            state_code: "TX".to_string(),
            salary_min_annual: min,
            salary_max_annual: max,
            salary_imputed: false,
            job_type: JobType::FullTime,
            job_url: None,
            posted_at: None,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [5, 1, 3]), Some(3));
        assert_eq!(median(&mut [10, 20]), Some(15));
        assert_eq!(median(&mut [10, 13]), Some(12));
    }

    #[test]
    fn test_imputes_with_uniform_spread() {
        let mut records = vec![
            record("a", Source::Adzuna, Some(50_000), Some(70_000)),
            record("b", Source::Jooble, Some(90_000), Some(110_000)),
            record("c", Source::Adzuna, Some(60_000), None),
        ];

        let outcome = impute_salary_max(&mut records, SpreadScope::Global);

        assert_eq!(outcome.median_spread, Some(20_000));
        assert_eq!(outcome.imputed, 1);
        assert_eq!(records[2].salary_max_annual, Some(80_000));
        assert!(records[2].salary_imputed);
        assert!(!records[0].salary_imputed);
        assert!(!records[1].salary_imputed);
    }

    #[test]
    fn test_no_basis_is_a_no_op() {
        let mut records = vec![
            record("a", Source::Adzuna, Some(60_000), None),
            record("b", Source::Adzuna, None, None),
        ];

        let outcome = impute_salary_max(&mut records, SpreadScope::Global);

        assert!(outcome.is_undefined());
        assert_eq!(outcome.imputed, 0);
        assert_eq!(records[0].salary_max_annual, None);
        assert!(!records[0].salary_imputed);
    }

    #[test]
    fn test_records_without_floor_are_untouched() {
        let mut records = vec![
            record("a", Source::Adzuna, Some(50_000), Some(70_000)),
            record("b", Source::Adzuna, None, Some(90_000)),
        ];

        let outcome = impute_salary_max(&mut records, SpreadScope::Global);

        assert_eq!(outcome.imputed, 0);
        assert!(!outcome.is_undefined());
        assert_eq!(records[1].salary_min_annual, None);
    }

    #[test]
    fn test_huge_floor_saturates() {
        let mut records = vec![
            record("a", Source::Adzuna, Some(50_000), Some(70_000)),
            record("b", Source::Adzuna, Some(u64::MAX - 5), None),
        ];

        let outcome = impute_salary_max(&mut records, SpreadScope::Global);

        assert_eq!(outcome.imputed, 1);
        assert_eq!(records[1].salary_max_annual, Some(u64::MAX));
    }

    #[test]
    fn test_per_source_scope_falls_back_to_global() {
        let mut records = vec![
            record("a", Source::Adzuna, Some(50_000), Some(60_000)),
            record("b", Source::UsaJobs, Some(50_000), Some(90_000)),
            record("c", Source::UsaJobs, Some(50_000), Some(90_000)),
            record("d", Source::Adzuna, Some(70_000), None),
            record("e", Source::Jooble, Some(70_000), None),
        ];

        let outcome = impute_salary_max(&mut records, SpreadScope::PerSource);

        assert_eq!(outcome.median_spread, Some(40_000));
        assert_eq!(records[3].salary_max_annual, Some(80_000));
        assert_eq!(records[4].salary_max_annual, Some(110_000));
        assert_eq!(outcome.imputed, 2);
    }
}
