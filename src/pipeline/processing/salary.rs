use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::common::constants::MAX_ANNUAL_SALARY;
use crate::domain::{PayPeriod, RawSalary};

/// Annualized salary bounds in whole US dollars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SalaryRange {
    pub const EMPTY: SalaryRange = SalaryRange { min: None, max: None };

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Result of normalizing one record's salary field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryParse {
    /// The source supplied no salary information
    Absent,
    Parsed(SalaryRange),
    /// Salary information was present but could not be read
    Unparseable,
}

impl SalaryParse {
    pub fn range(&self) -> SalaryRange {
        match self {
            SalaryParse::Parsed(range) => *range,
            SalaryParse::Absent | SalaryParse::Unparseable => SalaryRange::EMPTY,
        }
    }
}

static SLASH_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").expect("valid regex"));

static K_NOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*k\b").expect("valid regex"));

static QUALIFIERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:starting at|up to|from|usd)\b|\$").expect("valid regex"));

static RANGE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:-|–|—|\bto\b)\s*").expect("valid regex"));

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("valid regex"));

/// Pay-period markers, checked in order; longer spellings come before their prefixes
const PERIOD_MARKERS: &[(&str, PayPeriod)] = &[
    ("per hour", PayPeriod::Hourly),
    ("an hour", PayPeriod::Hourly),
    ("/hour", PayPeriod::Hourly),
    ("/hr", PayPeriod::Hourly),
    ("hourly", PayPeriod::Hourly),
    ("per week", PayPeriod::Weekly),
    ("a week", PayPeriod::Weekly),
    ("/week", PayPeriod::Weekly),
    ("/wk", PayPeriod::Weekly),
    ("weekly", PayPeriod::Weekly),
    ("per month", PayPeriod::Monthly),
    ("a month", PayPeriod::Monthly),
    ("/month", PayPeriod::Monthly),
    ("/mo", PayPeriod::Monthly),
    ("monthly", PayPeriod::Monthly),
    ("per year", PayPeriod::Annual),
    ("a year", PayPeriod::Annual),
    ("/year", PayPeriod::Annual),
    ("/yr", PayPeriod::Annual),
    ("per annum", PayPeriod::Annual),
    ("annually", PayPeriod::Annual),
    ("yearly", PayPeriod::Annual),
];

/// Normalize whatever salary representation a record carries
pub fn normalize_salary(raw: Option<&RawSalary>) -> SalaryParse {
    match raw {
        None => SalaryParse::Absent,
        Some(RawSalary::Text { text }) => {
            if super::present(Some(text.as_str())).is_none() {
                return SalaryParse::Absent;
            }
            match parse_salary_text(text) {
                Some(range) => SalaryParse::Parsed(range),
                None => SalaryParse::Unparseable,
            }
        }
        Some(RawSalary::Range { min, max, period }) => {
            if min.is_none() && max.is_none() {
                return SalaryParse::Absent;
            }
            let range = annualize_range(*min, *max, *period);
            if range.is_empty() {
                SalaryParse::Unparseable
            } else {
                SalaryParse::Parsed(range)
            }
        }
    }
}

/// Parse free salary text into an annual range.
///
/// Returns `None` when the text holds no readable amount or carries a token
/// that is neither a number, a pay-period marker nor a known qualifier.
pub fn parse_salary_text(text: &str) -> Option<SalaryRange> {
    let lowered = text.trim().to_lowercase();
    let compact = SLASH_SPACING.replace_all(&lowered, "/");
    let expanded = expand_k_notation(&compact);

    let (period, remainder) = split_period(&expanded);
    let stripped = QUALIFIERS.replace_all(&remainder, " ");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }

    let mut amounts = Vec::with_capacity(2);
    for piece in RANGE_SEPARATOR.split(stripped) {
        amounts.push(parse_amount(piece.trim())?);
    }

    let range = match amounts.as_slice() {
        [single] => annualize_range(Some(*single), Some(*single), period),
        [low, high] => annualize_range(Some(*low), Some(*high), period),
        _ => return None,
    };
    if range.is_empty() {
        None
    } else {
        Some(range)
    }
}

/// Convert numeric bounds quoted per `period` into whole annual dollars.
/// Non-positive, non-finite or implausibly large bounds become `None`;
/// inverted bounds are swapped.
pub fn annualize_range(min: Option<f64>, max: Option<f64>, period: PayPeriod) -> SalaryRange {
    let multiplier = period.annual_multiplier() as f64;
    let annual = |value: Option<f64>| -> Option<u64> {
        let scaled = (value? * multiplier).round();
        if scaled.is_finite() && scaled >= 1.0 && scaled <= MAX_ANNUAL_SALARY as f64 {
            Some(scaled as u64)
        } else {
            None
        }
    };
    order_bounds(annual(min), annual(max))
}

/// Apply the annual-range rules to bounds that are already annual.
/// Running this on its own output changes nothing.
pub fn normalize_annual(min: Option<u64>, max: Option<u64>) -> SalaryRange {
    let valid = |v: &u64| *v > 0 && *v <= MAX_ANNUAL_SALARY;
    order_bounds(min.filter(valid), max.filter(valid))
}

fn order_bounds(min: Option<u64>, max: Option<u64>) -> SalaryRange {
    match (min, max) {
        (Some(low), Some(high)) if low > high => SalaryRange { min: Some(high), max: Some(low) },
        _ => SalaryRange { min, max },
    }
}

fn expand_k_notation(text: &str) -> String {
    K_NOTATION
        .replace_all(text, |caps: &Captures| {
            let digits = caps[1].replace(',', "");
            match digits.parse::<f64>() {
                Ok(value) => format!("{}", (value * 1000.0).round() as u64),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn split_period(text: &str) -> (PayPeriod, String) {
    for (marker, period) in PERIOD_MARKERS {
        if let Some(pos) = text.find(marker) {
            let mut remainder = String::with_capacity(text.len());
            remainder.push_str(&text[..pos]);
            remainder.push(' ');
            remainder.push_str(&text[pos + marker.len()..]);
            return (*period, remainder);
        }
    }
    (PayPeriod::Annual, text.to_string())
}

fn parse_amount(piece: &str) -> Option<f64> {
    if !AMOUNT.is_match(piece) {
        return None;
    }
    piece.replace(',', "").parse::<f64>().ok()
}
