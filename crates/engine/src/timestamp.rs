//! Timestamp parsing for onset and exposure cells.
//!
//! Cells hold ISO-like strings: `YYYY-MM-DD HH:mm` or `YYYY-MM-DDTHH:mm`,
//! optionally with seconds, or a bare date. Anything else is treated as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap_or_else(|e| panic!("date token pattern: {e}"))
});

/// Parse a cell value as a timestamp. Returns `None` for blanks and garbage.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    // Offset-qualified ISO strings keep their wall-clock time
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Canonical display form used when writing timestamps back into cells.
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// First `YYYY-MM-DD`-shaped token in the value, used to group timestamps by
/// calendar date.
pub fn date_prefix(value: &str) -> Option<&str> {
    DATE_TOKEN.find(value).map(|m| m.as_str())
}

/// Hours from `start` to `end` (negative if `end` is earlier).
pub fn hours_between(start: &NaiveDateTime, end: &NaiveDateTime) -> f64 {
    (*end - *start).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_space_and_t_separator() {
        let a = parse_timestamp("2024-05-01 12:30").unwrap();
        let b = parse_timestamp("2024-05-01T12:30").unwrap();
        assert_eq!(a, b);
        assert_eq!(format_timestamp(&a), "2024-05-01 12:30");
    }

    #[test]
    fn test_accepts_seconds_and_bare_date() {
        assert!(parse_timestamp("2024-05-01 12:30:15").is_some());
        let midnight = parse_timestamp("2024-05-01").unwrap();
        assert_eq!(format_timestamp(&midnight), "2024-05-01 00:00");
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45 10:00"), None);
    }

    #[test]
    fn test_date_prefix() {
        assert_eq!(date_prefix("2024-05-01 12:30"), Some("2024-05-01"));
        assert_eq!(date_prefix("onset 2024-05-02T08:00"), Some("2024-05-02"));
        assert_eq!(date_prefix("unknown"), None);
    }

    #[test]
    fn test_hours_between() {
        let start = parse_timestamp("2024-05-01 12:00").unwrap();
        let end = parse_timestamp("2024-05-02 06:30").unwrap();
        assert!((hours_between(&start, &end) - 18.5).abs() < 1e-9);
    }
}
