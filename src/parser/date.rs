// file: src/parser/date.rs
// description: publication timestamp parsing into unix seconds
// reference: https://docs.rs/chrono

use chrono::DateTime;

const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Parses `YYYY-MM-DDTHH:MM:SS±HH:MM` (or RFC 3339) into UTC epoch seconds.
///
/// Dates before the epoch and unparseable values yield `None`.
pub fn parse_timestamp(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_str(value, OFFSET_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()?;

    u64::try_from(parsed.timestamp()).ok()
}
