//! Timestamp parsing and local-time rendering.

use crate::error::{EduError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Format used for due dates in flattened documents and the health check.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d %I:%M %p %Z";

/// Format used for the current date and time inside chat prompts.
pub const PROMPT_DATETIME_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p %Z";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 timestamp.
///
/// Offsets (including `Z`) are honoured; naive timestamps are taken as UTC.
/// Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render a UTC instant in the given timezone.
pub fn format_in(dt: DateTime<Utc>, tz: Tz, format: &str) -> String {
    dt.with_timezone(&tz).format(format).to_string()
}

/// Normalize a stored due date for display.
///
/// Absent dates render as "No due date"; unparseable ones come back unchanged.
pub fn format_due_date(raw: Option<&str>, tz: Tz) -> String {
    match raw {
        None => "No due date".to_string(),
        Some(s) if s.trim().is_empty() => "No due date".to_string(),
        Some(s) => match parse_timestamp(s) {
            Some(dt) => format_in(dt, tz, DUE_DATE_FORMAT),
            None => s.to_string(),
        },
    }
}

/// Parse an IANA timezone name such as `America/New_York`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| EduError::Config(format!("Unknown timezone '{}': {}", name, e)))
}
