use anyhow::Result;
use chrono::{DateTime, Local};
use std::borrow::Cow;

/// Handles parsing timestamps from Claude Code session logs
pub struct TimestampParser;

impl TimestampParser {
    /// Parse an ISO-8601 timestamp into local wall-clock time.
    ///
    /// Accepts a literal `Z` suffix or an explicit numeric offset. A `Z` suffix is
    /// rewritten to `+00:00` before parsing. Timestamps without any offset are rejected.
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Local>> {
        if timestamp_str.is_empty() {
            anyhow::bail!("Empty timestamp");
        }

        let timestamp = match timestamp_str.strip_suffix('Z') {
            Some(stripped) => Cow::Owned(format!("{}+00:00", stripped)),
            None => Cow::Borrowed(timestamp_str),
        };

        let parsed = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| anyhow::anyhow!("Failed to parse timestamp {:?}: {}", timestamp_str, e))?;

        Ok(parsed.with_timezone(&Local))
    }

    /// Calendar-day bucket key for a local timestamp.
    pub fn day_key(timestamp: &DateTime<Local>) -> String {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
