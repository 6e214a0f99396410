// src/utils/time.rs

//! Publish-date formatting for the published collection.

use chrono::{DateTime, NaiveDate, Utc};

/// Display format used in the published JSON, e.g. "May 1, 2024".
const DISPLAY_FORMAT: &str = "%B %-d, %Y";

/// Parse format accepting both padded and unpadded day numbers.
const PARSE_FORMAT: &str = "%B %d, %Y";

/// Format a publish timestamp as "Month Day, Year".
pub fn format_date(t: DateTime<Utc>) -> String {
    t.format(DISPLAY_FORMAT).to_string()
}

/// Re-parse a display date produced by [`format_date`].
///
/// Returns `None` for anything that does not match; the aggregator treats
/// such entries as minimally old when sorting.
pub fn parse_display_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), PARSE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(format_date(t), "May 1, 2024");

        let t = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_date(t), "January 1, 2000");
    }

    #[test]
    fn test_round_trip() {
        let t = Utc.with_ymd_and_hms(2023, 12, 25, 8, 0, 0).unwrap();
        let parsed = parse_display_date(&format_date(t)).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
    }

    #[test]
    fn test_parse_accepts_unpadded_and_padded_days() {
        assert_eq!(
            parse_display_date("March 1, 2024"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            parse_display_date("March 01, 2024"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_display_date("not a date").is_none());
        assert!(parse_display_date("2024-03-01").is_none());
        assert!(parse_display_date("").is_none());
    }
}
