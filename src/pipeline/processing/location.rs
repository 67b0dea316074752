use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::common::constants::STATE_UNKNOWN;

/// The 50 states plus DC, full name to USPS code
pub const STATES: [(&str, &str); 51] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

static NAME_TO_CODE: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    STATES
        .iter()
        .map(|(name, code)| (name.to_lowercase(), *code))
        .collect()
});

static CODE_TO_NAME: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATES.iter().map(|(name, code)| (*code, *name)).collect());

static TRAILING_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\d{5}(?:-\d{4})?$").expect("valid regex"));

/// Location texts that name no place a city could be taken from
const NON_PLACES: &[&str] = &["remote", "anywhere", "nationwide", "united states", "usa", "us"];

/// City and state resolved from a free-text location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizedLocation {
    pub city: Option<String>,
    /// Two-letter USPS code or `"Unknown"`
    pub state_code: String,
}

impl StandardizedLocation {
    pub fn unknown(city: Option<String>) -> Self {
        Self { city, state_code: STATE_UNKNOWN.to_string() }
    }

    pub fn is_known(&self) -> bool {
        self.state_code != STATE_UNKNOWN
    }
}

/// Resolve a state token (full name or code, any case) to its USPS code
pub fn lookup_state(token: &str) -> Option<&'static str> {
    let token = TRAILING_ZIP.replace(token.trim(), "");
    let token = token.trim();
    if token.len() == 2 {
        let upper = token.to_ascii_uppercase();
        return CODE_TO_NAME.get_key_value(upper.as_str()).map(|(code, _)| *code);
    }
    NAME_TO_CODE.get(&token.to_lowercase()).copied()
}

/// Split a location like `"Houston, Texas"` into city and state code.
///
/// The text after the last comma is the state candidate. Anything that does
/// not resolve leaves `state_code` as `"Unknown"` and keeps a best-effort city.
pub fn standardize_location(raw: Option<&str>) -> StandardizedLocation {
    let Some(text) = super::present(raw) else {
        return StandardizedLocation::unknown(None);
    };

    match text.rsplit_once(',') {
        Some((head, tail)) => {
            let city = head.split(',').next().and_then(city_token);
            match lookup_state(tail) {
                Some(code) => StandardizedLocation { city, state_code: code.to_string() },
                None => StandardizedLocation::unknown(city),
            }
        }
        None => match lookup_state(text) {
            Some(code) => StandardizedLocation { city: None, state_code: code.to_string() },
            None => StandardizedLocation::unknown(city_token(text)),
        },
    }
}

/// Standardize `raw`, falling back to the collector's search location for the state
pub fn standardize_with_fallback(raw: Option<&str>, search_location: Option<&str>) -> StandardizedLocation {
    let mut location = standardize_location(raw);
    if !location.is_known() {
        let fallback = super::present(search_location)
            .filter(|s| s.len() == 2)
            .and_then(lookup_state);
        if let Some(code) = fallback {
            location.state_code = code.to_string();
        }
    }
    location
}

fn city_token(segment: &str) -> Option<String> {
    let city = segment.trim();
    if city.is_empty() || NON_PLACES.contains(&city.to_lowercase().as_str()) {
        None
    } else {
        Some(city.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_and_code_resolve_identically() {
        let by_name = standardize_location(Some("Houston, Texas"));
        let by_code = standardize_location(Some("Houston, TX"));
        assert_eq!(by_name, by_code);
        assert_eq!(by_name.city.as_deref(), Some("Houston"));
        assert_eq!(by_name.state_code, "TX");
    }

    #[test]
    fn test_every_state_round_trips() {
        for (name, code) in STATES {
            let from_name = standardize_location(Some(&format!("Somewhere, {}", name)));
            assert_eq!(from_name.state_code, code);
            let from_code = standardize_location(Some(&format!("Somewhere, {}", from_name.state_code)));
            assert_eq!(from_code.state_code, code);
            assert_eq!(CODE_TO_NAME.get(code), Some(&name));
        }
    }

    #[test]
    fn test_code_is_uppercased() {
        let location = standardize_location(Some("austin, tx"));
        assert_eq!(location.state_code, "TX");
        assert_eq!(location.city.as_deref(), Some("austin"));
    }

    #[test]
    fn test_remote_is_unknown_with_no_city() {
        let location = standardize_location(Some("Remote"));
        assert_eq!(location.state_code, "Unknown");
        assert_eq!(location.city, None);
    }

    #[test]
    fn test_empty_and_missing_are_unknown() {
        assert_eq!(standardize_location(Some("")).state_code, "Unknown");
        assert_eq!(standardize_location(Some("   ")).state_code, "Unknown");
        assert_eq!(standardize_location(None).state_code, "Unknown");
    }

    #[test]
    fn test_non_us_location_keeps_city() {
        let location = standardize_location(Some("Toronto, Ontario"));
        assert_eq!(location.state_code, "Unknown");
        assert_eq!(location.city.as_deref(), Some("Toronto"));
    }

    #[test]
    fn test_splits_on_last_comma_and_ignores_zip() {
        let location = standardize_location(Some("Houston, Harris County, TX 77002"));
        assert_eq!(location.state_code, "TX");
        assert_eq!(location.city.as_deref(), Some("Houston"));

        let dc = standardize_location(Some("Washington, District of Columbia"));
        assert_eq!(dc.state_code, "DC");
    }

    #[test]
    fn test_state_only_location() {
        let location = standardize_location(Some("California"));
        assert_eq!(location.state_code, "CA");
        assert_eq!(location.city, None);
    }

    #[test]
    fn test_invalid_two_letter_token_is_unknown() {
        assert_eq!(standardize_location(Some("Springfield, ZZ")).state_code, "Unknown");
    }

    #[test]
    fn test_search_location_fallback() {
        let location = standardize_with_fallback(Some("Remote"), Some("wa"));
        assert_eq!(location.state_code, "WA");

        let kept = standardize_with_fallback(Some("Denver, CO"), Some("TX"));
        assert_eq!(kept.state_code, "CO");

        let ignored = standardize_with_fallback(Some("Remote"), Some("Houston"));
        assert_eq!(ignored.state_code, "Unknown");
    }
}
