//! Reusable formatting utilities for CLI output
//!
//! Common formatting functions for timestamps, sizes and progress values
//! used across multiple commands.

use chrono::{TimeZone, Utc};

/// Format Unix timestamp (milliseconds) to local date/time string.
///
/// Returns "N/A" if the timestamp is zero or invalid.
///
/// # Example output
/// `01/15/2025 14:30 UTC+8`
pub fn format_timestamp_local(millis: i64) -> String {
    if millis <= 0 {
        return "N/A".to_string();
    }

    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => {
            let local = dt.with_timezone(&chrono::Local);
            let date_time = local.format("%m/%d/%Y %H:%M").to_string();
            format!(
                "{} {}",
                date_time,
                offset_label(local.offset().local_minus_utc())
            )
        }
        _ => "N/A".to_string(),
    }
}

/// Convert a UTC offset (seconds) to a short label like `UTC`, `UTC+8`, `UTC-5:30`.
pub fn offset_label(offset_secs: i32) -> String {
    if offset_secs == 0 {
        return "UTC".to_string();
    }
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.unsigned_abs();
    let (hours, mins) = (abs / 3600, (abs % 3600) / 60);
    if mins == 0 {
        format!("UTC{}{}", sign, hours)
    } else {
        format!("UTC{}{}:{:02}", sign, hours, mins)
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
