use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Error;

// Literal UTC designator, optional fraction up to nanoseconds.
const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

const UNITS: [(&str, u64); 4] = [
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
    ("B", 1),
];

/// Renders a byte count in the largest 1024-based unit, two decimals.
pub fn format_size(bytes: u64) -> String {
    let (unit, scale) = UNITS
        .iter()
        .find(|(_, scale)| bytes >= *scale)
        .copied()
        .unwrap_or(("B", 1));

    format!("{:.2} {}", bytes as f64 / scale as f64, unit)
}

/// "{days} days ago" for a config blob `created` timestamp, whole days
/// counted from `now`.
pub fn age_description(timestamp: &str, now: DateTime<Utc>) -> Result<String, Error> {
    let created = NaiveDateTime::parse_from_str(timestamp, CREATED_FORMAT)
        .map_err(|e| Error::TimestampParsingError(format!("{:?}: {}", timestamp, e)))?
        .and_utc();

    let days = (now - created).num_hours() / 24;
    Ok(format!("{} days ago", days))
}
