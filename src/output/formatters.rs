//! Reusable formatting utilities for CLI output

use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

/// Format a `ModifiedDate` value as local date/time.
///
/// Accepts ISO-8601 (current caches) and epoch milliseconds (older caches).
/// Anything else is shown as-is; an empty value is shown as "N/A".
///
/// # Example output
/// `01/15/2025 14:30 PST`
pub fn format_modified(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "N/A".to_string();
    }

    let parsed = value.parse::<DateTime<Utc>>().ok().or_else(|| {
        value
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    });

    match parsed {
        Some(dt) => {
            let local = dt.with_timezone(&Local);
            format!(
                "{} {}",
                local.format("%m/%d/%Y %H:%M"),
                offset_to_tz_abbrev(local.offset().local_minus_utc())
            )
        }
        None => value.to_string(),
    }
}

/// Convert UTC offset (seconds) to timezone abbreviation.
///
/// Falls back to `UTC+N` for uncommon offsets.
pub fn offset_to_tz_abbrev(offset_secs: i32) -> Cow<'static, str> {
    let offset_hours = offset_secs / 3600;
    let abbrev = match offset_hours {
        -10 => "HST",
        -9 => "AKST",
        -8 => "PST",
        -7 => "MST",
        -6 => "CST",
        -5 => "EST",
        -4 => "AST",
        0 => "UTC",
        1 => "CET",
        2 => "EET",
        3 => "MSK",
        9 => "JST",
        10 => "AEST",
        12 => "NZST",
        _ => return Cow::Owned(format!("UTC{:+}", offset_hours)),
    };
    Cow::Borrowed(abbrev)
}

/// Format an elapsed duration as `2h 15m 30s`, `5m 10s` or `45s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs == 0 {
        return format!("{}ms", elapsed.as_millis());
    }

    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate to `max_chars` characters with an ellipsis
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
