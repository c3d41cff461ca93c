//! ISO calendar week bucketing.

use crate::models::WeekBucket;
use chrono::{DateTime, Datelike, Utc};

/// Map UTC epoch seconds to the ISO-8601 week containing them.
///
/// Returns `None` when the timestamp is non-finite or its ISO year falls
/// outside 1..=9999, where the `YYYY-Www` key would no longer sort
/// chronologically. Always evaluated in UTC, never the local zone.
pub fn to_week_bucket(timestamp: f64) -> Option<WeekBucket> {
    let dt = to_utc(timestamp)?;
    let week = dt.iso_week();
    if !ISO_YEARS.contains(&week.year()) {
        return None;
    }
    Some(WeekBucket::new(week.year(), week.week()))
}

const ISO_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn to_utc(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return None;
    }

    let secs = timestamp.floor();
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }

    let nanos = ((timestamp - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> f64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap().timestamp() as f64
    }

    #[test]
    fn test_monday_starts_first_week() {
        // 2024-01-01 is a Monday
        let bucket = to_week_bucket(ts(2024, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(bucket.as_str(), "2024-W01");
    }

    #[test]
    fn test_sunday_before_belongs_to_previous_year() {
        let bucket = to_week_bucket(ts(2023, 12, 31, 23, 59, 59)).unwrap();
        assert_eq!(bucket.as_str(), "2023-W52");
    }

    #[test]
    fn test_iso_year_differs_from_calendar_year() {
        // 2021-01-03 (Sunday) is in ISO week 53 of 2020
        assert_eq!(to_week_bucket(ts(2021, 1, 3, 12, 0, 0)).unwrap().as_str(), "2020-W53");
        // 2024-12-30 (Monday) is in ISO week 1 of 2025
        assert_eq!(to_week_bucket(ts(2024, 12, 30, 0, 0, 0)).unwrap().as_str(), "2025-W01");
    }

    #[test]
    fn test_fractional_seconds() {
        let t = ts(2024, 1, 7, 23, 59, 59) + 0.75;
        assert_eq!(to_week_bucket(t).unwrap().as_str(), "2024-W01");
        assert_eq!(to_week_bucket(t + 0.25).unwrap().as_str(), "2024-W02");
    }

    #[test]
    fn test_zero_padded_week() {
        assert_eq!(to_week_bucket(ts(2024, 3, 5, 10, 0, 0)).unwrap().as_str(), "2024-W10");
        assert_eq!(to_week_bucket(0.0).unwrap().as_str(), "1970-W01");
    }

    #[test]
    fn test_malformed_timestamps() {
        assert!(to_week_bucket(f64::NAN).is_none());
        assert!(to_week_bucket(f64::INFINITY).is_none());
        assert!(to_week_bucket(1e30).is_none());
    }

    #[test]
    fn test_years_outside_four_digits_rejected() {
        // Year 11476, representable by chrono but not as a four-digit key
        assert!(to_week_bucket(3e11).is_none());
        // Year -1
        assert!(to_week_bucket(ts(-1, 6, 1, 0, 0, 0)).is_none());
        assert!(to_week_bucket(ts(9999, 6, 1, 0, 0, 0))
            .unwrap()
            .as_str()
            .starts_with("9999-W"));
        assert!(to_week_bucket(ts(1, 6, 1, 0, 0, 0))
            .unwrap()
            .as_str()
            .starts_with("0001-W"));
    }
}
