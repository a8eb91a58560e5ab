//! Formatting helpers shared by front ends.

use crate::combo::FeedEntry;
use chrono::{DateTime, Utc};

/// Wall-clock time of a record, `HH:MM:SS` in UTC.
///
/// Out-of-range timestamps render as `--:--:--`.
pub fn format_clock(timestamp_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(ts) => ts.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// One feed row as plain text.
///
/// Messages render as `HH:MM:SS [source] author: body` (no author part for
/// system lines), combos as `HH:MM:SS [source] emote x N`.
pub fn format_entry(entry: &FeedEntry<'_>) -> String {
    let record = entry.record();
    let clock = format_clock(record.timestamp_ms());
    let source = record.source().label();
    match entry {
        FeedEntry::Combo { emote, count, .. } => {
            format!("{} [{}] {} x {}", clock, source, emote, count)
        }
        FeedEntry::Message(record) if record.author_name().is_empty() => {
            format!("{} [{}] {}", clock, source, record.body())
        }
        FeedEntry::Message(record) => {
            format!(
                "{} [{}] {}: {}",
                clock,
                source,
                record.author_name(),
                record.body()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_clock() {
        // 2024-06-01T12:34:56.789Z
        let ms = Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 34, 56)
            .unwrap()
            .timestamp_millis()
            + 789;
        assert_eq!(format_clock(ms), "12:34:56");
        assert_eq!(format_clock(i64::MAX), "--:--:--");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now - Duration::seconds(5), now), "5s ago");
        assert_eq!(format_relative_time(now - Duration::minutes(3), now), "3m ago");
        assert_eq!(format_relative_time(now - Duration::hours(2), now), "2h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_relative_time(now - Duration::days(9), now), "Jun 01");
        assert_eq!(format_relative_time(now + Duration::seconds(5), now), "just now");
    }
}
