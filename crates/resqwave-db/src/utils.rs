//! Shared utility functions

use chrono::{DateTime, SecondsFormat, Utc};

/// Parse an RFC3339 timestamp into UTC
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp the way it is stored in SQLite
///
/// Fixed-width so that stored timestamps sort correctly as text.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
