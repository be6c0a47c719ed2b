use chrono::{DateTime, Utc};

/// Fixed-width UTC timestamp, as used by snapshot.debian.org.
pub const FIRST_SEEN_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Normalize an HTTP `Last-Modified` value into a `first_seen` string.
///
/// Returns `None` when the header cannot be parsed.
pub fn first_seen_from_http_date(value: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc2822(value.trim()).ok()?;
    Some(parsed.with_timezone(&Utc).format(FIRST_SEEN_FORMAT).to_string())
}
