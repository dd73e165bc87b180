use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Returns the current time in seconds since the Unix epoch
pub fn current_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Calculate seconds since a given timestamp
///
/// Returns 0 if the timestamp is in the future
pub fn time_since(timestamp: u64) -> u64 {
    current_time().saturating_sub(timestamp)
}

/// Format a time difference in a human-readable format
pub fn format_time_diff(timestamp: u64, include_seconds: bool) -> String {
    let diff = time_since(timestamp);

    if diff < 60 {
        if include_seconds {
            format!("{} seconds ago", diff)
        } else {
            String::from("just now")
        }
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}

/// RFC 3339 rendering of a Unix timestamp, or the raw number if out of range
pub fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}
