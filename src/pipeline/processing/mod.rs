// Cleaning stages: per-record transforms first, then the batch-wide ones
pub mod dedup;
pub mod identity;
pub mod impute;
pub mod job_type;
pub mod location;
pub mod salary;

pub use dedup::{deduplicate, deduplicate_against, DedupOutcome};
pub use identity::derive_job_id;
pub use impute::{impute_salary_max, ImputationOutcome, SpreadScope};
pub use job_type::classify_job_type;
pub use location::{standardize_location, standardize_with_fallback, StandardizedLocation};
pub use salary::{normalize_salary, SalaryParse, SalaryRange};

/// Literals the collectors write for "no value"
const EMPTY_MARKERS: &[&str] = &["null", "none", "nan"];

/// Trimmed text, or `None` when the value is blank or an empty marker
pub fn present(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || EMPTY_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_filters_empty_markers() {
        assert_eq!(present(Some("  Houston ")), Some("Houston"));
        assert_eq!(present(Some("")), None);
        assert_eq!(present(Some("NaN")), None);
        assert_eq!(present(Some("None")), None);
        assert_eq!(present(Some("null")), None);
        assert_eq!(present(None), None);
    }
}
