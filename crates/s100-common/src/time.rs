//! Timestamp parsing and S-100 date-time formatting.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// S-100 date-time form, e.g. `20211206T000000Z`.
const S100_DATETIME: &str = "%Y%m%dT%H%M%SZ";

/// Parse a series timestamp key.
///
/// Accepts RFC 3339 (with or without fractional seconds) and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` stamps, which are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format a record time the way S-100 attributes expect it.
pub fn format_s100_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(S100_DATETIME).to_string()
}

/// `issueDate` attribute value (`YYYYMMDD`).
pub fn format_issue_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

/// `issueTime` attribute value (`HHMMSSZ`).
pub fn format_issue_time(dt: &DateTime<Utc>) -> String {
    dt.format("%H%M%SZ").to_string()
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_variants() {
        let expected = Utc.with_ymd_and_hms(2021, 12, 6, 0, 15, 0).unwrap();
        assert_eq!(parse_timestamp("2021-12-06T00:15:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2021-12-06T00:15:00.000Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2021-12-06T00:15:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2021-12-06T00:15:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TimeParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_s100_formats() {
        let dt = Utc.with_ymd_and_hms(2021, 12, 6, 23, 5, 9).unwrap();
        assert_eq!(format_s100_datetime(&dt), "20211206T230509Z");
        assert_eq!(format_issue_date(&dt), "20211206");
        assert_eq!(format_issue_time(&dt), "230509Z");
    }
}
