use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::JobType;

/// Keyword rules in priority order. The first matching rule wins, so the
/// specific categories sit ahead of the generic full-time rule.
static RULES: Lazy<Vec<(JobType, Regex)>> = Lazy::new(|| {
    [
        (JobType::Internship, r"\bintern(?:ship)?s?\b"),
        (JobType::Contract, r"\bcontract(?:or|ors|ual)?\b"),
        (JobType::PartTime, r"\bpart[\s-]?time\b"),
        (JobType::Temporary, r"\btemp(?:orary)?\b"),
        (JobType::FullTime, r"\bfull[\s-]?time\b|\bpermanent\b"),
    ]
    .into_iter()
    .map(|(job_type, pattern)| (job_type, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Match a single piece of text against the rule list
pub fn match_job_type(text: &str) -> Option<JobType> {
    let text = text.to_lowercase().replace('_', " ");
    RULES
        .iter()
        .find(|(_, pattern)| pattern.is_match(&text))
        .map(|(job_type, _)| *job_type)
}

/// Classify a posting from its dedicated job-type field and its title.
///
/// The field decides whenever it matches a rule. The title is consulted only
/// when the field is empty or unrecognized, with one exception: an
/// internship keyword in the title outranks whatever the field says. With no
/// signal in either and no field at all, `assume_full_time` decides between
/// Full-time and Unknown.
pub fn classify_job_type(descriptor: Option<&str>, title: Option<&str>, assume_full_time: bool) -> JobType {
    let descriptor = super::present(descriptor);
    let from_title = super::present(title).and_then(match_job_type);

    if from_title == Some(JobType::Internship) {
        return JobType::Internship;
    }
    if let Some(job_type) = descriptor.and_then(match_job_type).or(from_title) {
        return job_type;
    }

    if descriptor.is_none() && assume_full_time {
        JobType::FullTime
    } else {
        JobType::Unknown
    }
}
