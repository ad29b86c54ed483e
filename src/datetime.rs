//! Timestamp helpers for HireOn.
//!
//! All timestamps are stored as fixed-width UTC strings with microsecond
//! precision (`2024-01-15T10:30:00.123456Z`), so string order in SQLite
//! equals chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current time as a storage timestamp.
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Format a UTC datetime in storage format.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts the storage format, any RFC 3339 string and the SQLite
/// `datetime('now')` format (`YYYY-MM-DD HH:MM:SS`, taken as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
