/// Sentinel stored in `state_code` when no US state could be resolved
pub const STATE_UNKNOWN: &str = "Unknown";

/// Timestamp layout the collectors embed in staging file names
pub const STAGING_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Work hours in a year (40h x 52 weeks)
pub const HOURS_PER_YEAR: u64 = 2080;
pub const WEEKS_PER_YEAR: u64 = 52;
pub const MONTHS_PER_YEAR: u64 = 12;

/// Largest annual salary accepted as real data; anything above is a data-entry error
pub const MAX_ANNUAL_SALARY: u64 = 10_000_000;

/// Number of entries kept in the "top companies" and "top titles" summary lists
pub const SUMMARY_TOP_N: usize = 15;
