//! Listing date parsing.
//!
//! The record application prints dates as `DD/MM/YYYY HH:MM`. Those are
//! read as UTC. Anything else gets one attempt with a handful of
//! locale-independent formats. Parsing never fails loudly: an unusable
//! string is simply `None`.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

static PRIMARY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{2})/(\d{2})/(\d{4})\s+(\d{2}):(\d{2})").ok());

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a listing date into an instant.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(caps) = PRIMARY.as_ref().and_then(|re| re.captures(raw)) {
        // A matching string is never reinterpreted by the fallback.
        let field = |i: usize| caps[i].parse::<u32>().ok();
        return match (field(1), field(2), caps[3].parse::<i32>().ok(), field(4), field(5)) {
            (Some(day), Some(month), Some(year), Some(hour), Some(minute)) => {
                from_components(year, month, day, hour, minute)
            }
            _ => None,
        };
    }

    parse_fallback(raw)
}

/// Parse an optional listing date.
pub fn parse_optional_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_date)
}

fn from_components(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    if year <= 1970
        || !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
        || hour > 23
        || minute > 59
    {
        return None;
    }
    // Rejects calendar-impossible dates such as 31/02.
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

fn parse_fallback(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_primary_format_is_utc() {
        assert_eq!(parse_date("25/12/2024 09:30"), Some(utc(2024, 12, 25, 9, 30)));
    }

    #[test]
    fn test_primary_format_inside_longer_text() {
        assert_eq!(
            parse_date("  01/03/2023 23:59 (edited)"),
            Some(utc(2023, 3, 1, 23, 59))
        );
    }

    #[test]
    fn test_primary_format_allows_wide_gap() {
        assert_eq!(parse_date("05/06/2021   07:05"), Some(utc(2021, 6, 5, 7, 5)));
    }

    #[test]
    fn test_every_in_range_component_round_trips() {
        for (d, mo, y, h, mi) in [(1, 1, 1971, 0, 0), (28, 2, 2023, 12, 30), (29, 2, 2024, 23, 59), (30, 4, 2030, 6, 1)] {
            let raw = format!("{:02}/{:02}/{} {:02}:{:02}", d, mo, y, h, mi);
            assert_eq!(parse_date(&raw), Some(utc(y, mo, d, h, mi)), "{}", raw);
        }
    }

    #[test]
    fn test_out_of_range_components_are_null() {
        assert_eq!(parse_date("01/13/2024 10:00"), None);
        assert_eq!(parse_date("01/12/2024 25:00"), None);
        assert_eq!(parse_date("00/12/2024 10:00"), None);
        assert_eq!(parse_date("01/12/2024 10:60"), None);
        assert_eq!(parse_date("01/00/2024 10:00"), None);
        assert_eq!(parse_date("32/01/2024 10:00"), None);
    }

    #[test]
    fn test_year_must_be_after_1970() {
        assert_eq!(parse_date("01/01/1970 10:00"), None);
        assert_eq!(parse_date("01/01/1969 10:00"), None);
    }

    #[test]
    fn test_impossible_calendar_date_is_null() {
        assert_eq!(parse_date("31/02/2024 10:00"), None);
        assert_eq!(parse_date("31/04/2024 10:00"), None);
        assert_eq!(parse_date("29/02/2023 10:00"), None);
    }

    #[test]
    fn test_empty_and_missing_are_null() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_optional_date(None), None);
        assert_eq!(parse_optional_date(Some("")), None);
    }

    #[test]
    fn test_fallback_formats() {
        assert_eq!(parse_date("2024-12-25T09:30:00Z"), Some(utc(2024, 12, 25, 9, 30)));
        assert_eq!(parse_date("2024-12-25T10:30:00+01:00"), Some(utc(2024, 12, 25, 9, 30)));
        assert_eq!(parse_date("2024-12-25 09:30"), Some(utc(2024, 12, 25, 9, 30)));
        assert_eq!(parse_date("2024-12-25"), Some(utc(2024, 12, 25, 0, 0)));
        assert_eq!(
            parse_date("Wed, 25 Dec 2024 09:30:00 +0000"),
            Some(utc(2024, 12, 25, 9, 30))
        );
    }

    #[test]
    fn test_garbage_is_null() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("25/12/24 09:30"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_optional_matches_plain() {
        let raw = "25/12/2024 09:30";
        assert_eq!(parse_optional_date(Some(raw)), parse_date(raw));
    }
}
