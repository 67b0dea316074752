use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::common::error::{CleanerError, Result};
use crate::config::CleaningConfig;
use crate::domain::{CleanedJobRecord, JobType, RawJobRecord, Source};
use crate::pipeline::processing::{
    classify_job_type, deduplicate, deduplicate_against, derive_job_id, impute_salary_max, normalize_salary,
    present, standardize_with_fallback, SalaryParse,
};

/// Non-fatal conditions surfaced in the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// A source contributed no raw records to this run
    EmptySource { source: Source },
    /// Records needed a salary ceiling but the batch had no spread to impute from
    ImputationUndefined { pending: usize },
}

/// Counts produced by one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub received: usize,
    pub received_by_source: BTreeMap<Source, usize>,
    /// Dropped for lacking a source tag or any usable identity
    pub unprocessable: usize,
    /// Batch records that made it through the per-record stages
    pub cleaned: usize,
    pub salary_parsed: usize,
    pub salary_missing: usize,
    pub salary_unparseable: usize,
    pub location_unknown: usize,
    pub job_type_unknown: usize,
    pub imputed: usize,
    pub median_spread: Option<u64>,
    /// Records already in the store that this batch was deduplicated against
    pub prior_records: usize,
    pub duplicates_removed: usize,
    /// Size of the deduplicated output
    pub output_records: usize,
    pub warnings: Vec<RunWarning>,
}

impl RunReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: started_at,
            received: 0,
            received_by_source: Source::ALL.into_iter().map(|s| (s, 0)).collect(),
            unprocessable: 0,
            cleaned: 0,
            salary_parsed: 0,
            salary_missing: 0,
            salary_unparseable: 0,
            location_unknown: 0,
            job_type_unknown: 0,
            imputed: 0,
            median_spread: None,
            prior_records: 0,
            duplicates_removed: 0,
            output_records: 0,
            warnings: Vec::new(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Post-run sanity check: the output is non-empty and no larger than its inputs
    pub fn verify(&self) -> Result<()> {
        if self.output_records == 0 {
            return Err(CleanerError::Verification(format!(
                "no cleaned records produced from {} raw records",
                self.received
            )));
        }
        if self.output_records > self.received + self.prior_records {
            return Err(CleanerError::Verification(format!(
                "{} cleaned records exceed {} raw and {} stored records",
                self.output_records, self.received, self.prior_records
            )));
        }
        Ok(())
    }
}

/// Cleaned batch plus the report describing how it was produced
#[derive(Debug, Clone)]
pub struct CleaningOutput {
    pub records: Vec<CleanedJobRecord>,
    pub report: RunReport,
}

enum RecordOutcome {
    Cleaned { record: CleanedJobRecord, salary: SalaryParse },
    Unprocessable,
}

/// Sequences the cleaning stages over a batch of raw records
#[derive(Debug, Clone, Default)]
pub struct CleaningPipeline {
    config: CleaningConfig,
}

impl CleaningPipeline {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Clean a batch on its own
    pub fn run(&self, batch: Vec<RawJobRecord>) -> CleaningOutput {
        self.clean(batch, None)
    }

    /// Clean a batch and deduplicate it against the records already stored
    pub fn run_against(&self, batch: Vec<RawJobRecord>, prior: Vec<CleanedJobRecord>) -> CleaningOutput {
        self.clean(batch, Some(prior))
    }

    #[instrument(skip_all, fields(batch = batch.len()))]
    fn clean(&self, batch: Vec<RawJobRecord>, prior: Option<Vec<CleanedJobRecord>>) -> CleaningOutput {
        let mut report = RunReport::new(Utc::now());
        report.received = batch.len();
        for raw in &batch {
            if let Some(source) = raw.source {
                *report.received_by_source.entry(source).or_default() += 1;
            }
        }
        for (source, count) in &report.received_by_source {
            if *count == 0 {
                warn!("{} contributed no raw records this run", source);
                report.warnings.push(RunWarning::EmptySource { source: *source });
            }
        }

        // Per-record stages; collect keeps input order
        let assume_full_time = self.config.assume_full_time_when_unspecified;
        let outcomes: Vec<RecordOutcome> = if self.config.parallel {
            batch.into_par_iter().map(|raw| clean_record(raw, assume_full_time)).collect()
        } else {
            batch.into_iter().map(|raw| clean_record(raw, assume_full_time)).collect()
        };

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Cleaned { record, salary } => {
                    match salary {
                        SalaryParse::Parsed(_) => report.salary_parsed += 1,
                        SalaryParse::Absent => report.salary_missing += 1,
                        SalaryParse::Unparseable => report.salary_unparseable += 1,
                    }
                    if !record.has_known_state() {
                        report.location_unknown += 1;
                    }
                    if record.job_type == JobType::Unknown {
                        report.job_type_unknown += 1;
                    }
                    records.push(record);
                }
                RecordOutcome::Unprocessable => report.unprocessable += 1,
            }
        }
        report.cleaned = records.len();
        info!(
            "Normalized {} records ({} unprocessable, {} unparseable salaries, {} unknown locations)",
            report.cleaned, report.unprocessable, report.salary_unparseable, report.location_unknown
        );

        // Global-view stages
        let imputation = impute_salary_max(&mut records, self.config.impute_scope);
        report.imputed = imputation.imputed;
        report.median_spread = imputation.median_spread;
        if imputation.is_undefined() {
            report.warnings.push(RunWarning::ImputationUndefined { pending: imputation.skipped });
        }

        let deduped = match prior {
            Some(prior) => {
                report.prior_records = prior.len();
                deduplicate_against(prior, records)
            }
            None => deduplicate(records),
        };
        report.duplicates_removed = deduped.removed;
        report.output_records = deduped.records.len();
        report.finished_at = Utc::now();

        info!(
            run_id = %report.run_id,
            "Cleaning finished: {} received, {} imputed, {} duplicates removed, {} output records",
            report.received, report.imputed, report.duplicates_removed, report.output_records
        );

        CleaningOutput { records: deduped.records, report }
    }
}

fn clean_record(raw: RawJobRecord, assume_full_time: bool) -> RecordOutcome {
    let Some(source) = raw.source else {
        debug!("Dropping record without a source tag");
        return RecordOutcome::Unprocessable;
    };
    let Some(job_id) = derive_job_id(source, &raw) else {
        debug!(%source, "Dropping record without an id or title");
        return RecordOutcome::Unprocessable;
    };

    let salary = normalize_salary(raw.salary.as_ref());
    let range = salary.range();
    let location = standardize_with_fallback(raw.location.as_deref(), raw.search_location.as_deref());
    let job_type = classify_job_type(raw.job_type.as_deref(), raw.title.as_deref(), assume_full_time);

    let owned = |value: Option<String>| present(value.as_deref()).map(str::to_string);
    let record = CleanedJobRecord {
        job_id,
        source,
        source_job_id: owned(raw.source_job_id),
        title: present(raw.title.as_deref()).unwrap_or_default().to_string(),
        company: owned(raw.company),
        location: owned(raw.location),
        city: location.city,
        state_code: location.state_code,
        salary_min_annual: range.min,
        salary_max_annual: range.max,
        salary_imputed: false,
        job_type,
        job_url: owned(raw.job_url),
        posted_at: raw.posted_at,
        observed_at: raw.observed_at,
    };
    RecordOutcome::Cleaned { record, salary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PayPeriod, RawSalary};
    use crate::pipeline::ingestion::sources::UsaJobsItem;
    use crate::pipeline::ingestion::{IntoRawRecord, StagingContext};
    use chrono::{Duration, TimeZone};

    fn observed(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 9, 22, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn raw(source: Source, id: &str, salary: Option<RawSalary>, location: &str) -> RawJobRecord {
        let mut raw = RawJobRecord::new(source, observed(0));
        raw.source_job_id = Some(id.to_string());
        raw.title = Some("Data Analyst".to_string());
        raw.location = Some(location.to_string());
        raw.salary = salary;
        raw
    }

    fn sequential() -> CleaningPipeline {
        CleaningPipeline::new(CleaningConfig { parallel: false, ..Default::default() })
    }

    #[test]
    fn test_unparseable_salary_survives_with_other_fields() {
        let mut record = raw(Source::Jooble, "1", Some(RawSalary::text("competitive")), "Houston, Texas");
        record.job_type = Some("Full-time".to_string());

        let output = sequential().run(vec![record]);

        assert_eq!(output.records.len(), 1);
        let cleaned = &output.records[0];
        assert_eq!(cleaned.salary_min_annual, None);
        assert_eq!(cleaned.salary_max_annual, None);
        assert_eq!(cleaned.state_code, "TX");
        assert_eq!(cleaned.job_type, JobType::FullTime);
        assert_eq!(output.report.salary_unparseable, 1);
    }

    #[test]
    fn test_records_without_identity_are_counted() {
        let mut anonymous = RawJobRecord::new(Source::Adzuna, observed(0));
        anonymous.company = Some("Acme".to_string());
        let mut untagged = raw(Source::Adzuna, "2", None, "Remote");
        untagged.source = None;

        let output = sequential().run(vec![anonymous, untagged, raw(Source::Adzuna, "3", None, "Remote")]);

        assert_eq!(output.report.unprocessable, 2);
        assert_eq!(output.report.cleaned, 1);
        assert_eq!(output.records[0].job_id, "adzuna:3");
    }

    #[test]
    fn test_empty_source_is_a_warning() {
        let output = sequential().run(vec![raw(Source::Adzuna, "1", None, "Austin, TX")]);

        assert!(output.report.warnings.contains(&RunWarning::EmptySource { source: Source::UsaJobs }));
        assert!(output.report.warnings.contains(&RunWarning::EmptySource { source: Source::Jooble }));
        assert_eq!(output.records.len(), 1);
    }

    #[test]
    fn test_full_batch_flow() {
        let batch = vec![
            raw(Source::Adzuna, "1", Some(RawSalary::Range { min: Some(50_000.0), max: Some(70_000.0), period: PayPeriod::Annual }), "Austin, TX"),
            raw(Source::Jooble, "9", Some(RawSalary::text("$60k")), "Dallas, Texas"),
            raw(Source::UsaJobs, "7", Some(RawSalary::Range { min: Some(60_000.0), max: None, period: PayPeriod::Annual }), "Denver, Colorado"),
            raw(Source::Adzuna, "1", None, "Austin, TX"),
        ];

        let output = CleaningPipeline::default().run(batch);
        let report = &output.report;

        assert_eq!(report.received, 4);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.output_records, 3);
        assert_eq!(report.imputed, 1);
        assert_eq!(report.median_spread, Some(10_000));
        assert!(report.warnings.is_empty());
        assert_eq!(output.records[0].job_id, "adzuna:1");
        assert_eq!(output.records[0].salary_max_annual, Some(70_000));
        assert_eq!(output.records[2].salary_max_annual, Some(70_000));
        assert!(output.records[2].salary_imputed);
        assert!(report.verify().is_ok());
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let batch: Vec<_> = (0..200)
            .map(|i| raw(Source::Jooble, &i.to_string(), Some(RawSalary::text(format!("${}/hr", 20 + i % 30))), "Austin, TX"))
            .collect();

        let parallel = CleaningPipeline::default().run(batch.clone());
        let serial = sequential().run(batch);

        assert_eq!(parallel.records, serial.records);
    }

    #[test]
    fn test_run_against_prefers_newer_observation() {
        let stored = sequential().run(vec![raw(Source::Adzuna, "1", None, "Austin, TX")]).records;
        let mut fresh = raw(Source::Adzuna, "1", Some(RawSalary::text("$90k")), "Austin, TX");
        fresh.observed_at = observed(60);

        let output = sequential().run_against(vec![fresh], stored);

        assert_eq!(output.report.prior_records, 1);
        assert_eq!(output.report.duplicates_removed, 1);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].salary_min_annual, Some(90_000));
    }

    #[test]
    fn test_federal_contract_specialist_keeps_offering_type() {
        let item: UsaJobsItem = serde_json::from_value(serde_json::json!({
            "MatchedObjectDescriptor": {
                "PositionID": "GSA-26-1102",
                "PositionTitle": "Contract Specialist",
                "PositionLocation": [{"CityName": "Fort Worth", "StateName": "Texas"}],
                "PositionOfferingType": [{"Name": "Permanent"}]
            }
        }))
        .unwrap();
        let ctx = StagingContext { observed_at: observed(0), search_location: None };

        let output = sequential().run(vec![item.into_raw(&ctx)]);

        assert_eq!(output.records[0].job_type, JobType::FullTime);
    }

    #[test]
    fn test_oversized_salary_does_not_abort_the_run() {
        let batch = vec![
            raw(Source::Adzuna, "1", Some(RawSalary::Range { min: Some(50_000.0), max: Some(70_000.0), period: PayPeriod::Annual }), "Austin, TX"),
            raw(Source::Adzuna, "2", Some(RawSalary::Range { min: Some(1e20), max: None, period: PayPeriod::Annual }), "Austin, TX"),
        ];

        let output = sequential().run(batch);

        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[1].salary_min_annual, None);
        assert_eq!(output.records[1].salary_max_annual, None);
        assert!(!output.records[1].salary_imputed);
        assert_eq!(output.report.salary_unparseable, 1);
    }

    #[test]
    fn test_verify_rejects_empty_output() {
        let output = sequential().run(Vec::new());
        assert!(matches!(output.report.verify(), Err(CleanerError::Verification(_))));
    }
}
