//! Timestamp helpers.

use chrono::{DateTime, Utc};

/// Format used for the human-readable time fields inside payloads.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render a timestamp for a payload time field.
pub fn format_event_time(at: DateTime<Utc>) -> String {
    at.format(EVENT_TIME_FORMAT).to_string()
}

/// The later of two timestamps.
///
/// Used to keep the events of one entity non-decreasing in time.
pub fn not_before(at: DateTime<Utc>, floor: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match floor {
        Some(floor) if floor > at => floor,
        _ => at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_event_time() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_event_time(at), "2024-03-09 14:05:07.000");
    }

    #[test]
    fn test_not_before() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(not_before(early, Some(late)), late);
        assert_eq!(not_before(late, Some(early)), late);
        assert_eq!(not_before(early, None), early);
    }
}
