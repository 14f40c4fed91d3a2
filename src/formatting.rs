//! Display text for history rows.
//!
//! Pure functions of the event and the current wall-clock time. Relative
//! times go stale as the clock advances, so callers recompute these on
//! every render pass instead of caching them.

use crate::history::types::SyncEvent;
use chrono::{Local, TimeZone, Utc};

const KILO: f64 = 1000.0;
const SUFFIXES: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Decimal-unit byte count: "300 Bytes", "3.0 kB", "1.5 MB".
pub fn natural_size(bytes: u64) -> String {
    if bytes == 1 {
        return "1 Byte".to_string();
    }
    let mut value = bytes as f64;
    if value < KILO {
        return format!("{bytes} Bytes");
    }
    for suffix in SUFFIXES {
        value /= KILO;
        if value < KILO {
            return format!("{value:.1} {suffix}");
        }
    }
    format!("{value:.1} {}", SUFFIXES[SUFFIXES.len() - 1])
}

/// Relative time: "now", "a minute ago", "3 hours ago". Negative deltas
/// (clock skew, events stamped in the future) render as "now".
pub fn natural_time(seconds_ago: i64) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let delta = seconds_ago.max(0);
    if delta == 0 {
        "now".to_string()
    } else if delta == 1 {
        "a second ago".to_string()
    } else if delta < MINUTE {
        format!("{delta} seconds ago")
    } else if delta < 2 * MINUTE {
        "a minute ago".to_string()
    } else if delta < HOUR {
        format!("{} minutes ago", delta / MINUTE)
    } else if delta < 2 * HOUR {
        "an hour ago".to_string()
    } else if delta < DAY {
        format!("{} hours ago", delta / HOUR)
    } else if delta < 2 * DAY {
        "a day ago".to_string()
    } else if delta < MONTH {
        format!("{} days ago", delta / DAY)
    } else if delta < 2 * MONTH {
        "a month ago".to_string()
    } else if delta < YEAR {
        format!("{} months ago", delta / MONTH)
    } else if delta < 2 * YEAR {
        "a year ago".to_string()
    } else {
        format!("{} years ago", delta / YEAR)
    }
}

/// Detail line under a row's file name: "Updated 3 minutes ago".
pub fn describe(event: &SyncEvent, now: i64) -> String {
    format!(
        "{} {}",
        event.action,
        natural_time(now - event.timestamp)
    )
}

/// Hover text: full path, size, action and absolute local time.
pub fn tooltip(event: &SyncEvent) -> String {
    let when = Utc
        .timestamp_opt(event.timestamp, 0)
        .single()
        .map(|t| t.with_timezone(&Local).format("%a %b %e %T %Y").to_string())
        .unwrap_or_else(|| event.timestamp.to_string());
    format!(
        "{}\n\nSize: {}\n{}: {}",
        event.path.display(),
        natural_size(event.size),
        event.action,
        when
    )
}
