use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

/// Canonical storage format for call timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a call timestamp in any of the accepted layouts.
///
/// Accepts a bare date (`2024-01-03`, midnight), a naive datetime with a
/// space or `T` separator and optional fractional seconds, or RFC 3339 with
/// an offset (converted to its naive UTC value). Returns `None` for anything
/// else, including empty strings.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a timestamp for storage.
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Every calendar day from `start` through `end`, inclusive.
/// Empty when `end` precedes `start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let len = (end - start).num_days() + 1;
    (0..len.max(0)).map(move |offset| start + Duration::days(offset))
}

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.and_then(|d| d.pred_opt())
}

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = date(2024, 1, 3).and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-03 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-03T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-03T14:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-03 14:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-03T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-03T16:30:00+02:00"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        assert_eq!(
            parse_timestamp("2024-01-03"),
            Some(date(2024, 1, 3).and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
        assert_eq!(parse_timestamp("2024-02-30 10:00:00"), None);
    }

    #[test]
    fn test_format_timestamp_roundtrip() {
        let dt = date(2024, 1, 3).and_hms_opt(9, 5, 7).unwrap();
        let s = format_timestamp(&dt);
        assert_eq!(s, "2024-01-03 09:05:07");
        assert_eq!(parse_timestamp(&s), Some(dt));
    }

    #[test]
    fn test_days_inclusive() {
        let days: Vec<NaiveDate> = days_inclusive(date(2024, 2, 27), date(2024, 3, 1)).collect();
        assert_eq!(
            days,
            vec![date(2024, 2, 27), date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
        assert_eq!(days_inclusive(date(2024, 1, 1), date(2024, 1, 1)).count(), 1);
        assert_eq!(days_inclusive(date(2024, 1, 2), date(2024, 1, 1)).count(), 0);
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2025, 1), Some(date(2025, 1, 31)));
        assert_eq!(last_day_of_month(2025, 2), Some(date(2025, 2, 28)));
        assert_eq!(last_day_of_month(2024, 2), Some(date(2024, 2, 29))); // Leap year
        assert_eq!(last_day_of_month(2025, 12), Some(date(2025, 12, 31)));
        assert_eq!(last_day_of_month(2025, 13), None);
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(date(2025, 1, 15)), 1);
        assert_eq!(quarter_of(date(2025, 3, 31)), 1);
        assert_eq!(quarter_of(date(2025, 4, 1)), 2);
        assert_eq!(quarter_of(date(2025, 7, 1)), 3);
        assert_eq!(quarter_of(date(2025, 12, 31)), 4);
    }
}
