//! FILENAME: core/rule-engine/src/dates.rs
//! PURPOSE: Date parsing and granularity comparisons for date rules.
//! CONTEXT: Dataset values arrive as text, so every date helper starts by
//! parsing. Plain numbers ("2024") are deliberately not dates.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];

/// How coarse a date comparison is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "day" | "date" => Some(Granularity::Day),
            "week" => Some(Granularity::Week),
            "month" => Some(Granularity::Month),
            "quarter" => Some(Granularity::Quarter),
            "year" => Some(Granularity::Year),
            _ => None,
        }
    }
}

/// Parses RFC 3339 timestamps, ISO-like date-times and a few common date layouts.
/// Offsets are dropped: the wall-clock date is what users see in the table.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn quarter_of(date: &NaiveDateTime) -> u32 {
    date.month0() / 3
}

/// True when both dates fall in the same day/week/month/quarter/year.
/// Weeks are ISO weeks (Monday start), so they can straddle a year boundary.
pub fn same_period(a: &NaiveDateTime, b: &NaiveDateTime, granularity: Granularity) -> bool {
    match granularity {
        Granularity::Day => a.date() == b.date(),
        Granularity::Week => a.iso_week() == b.iso_week(),
        Granularity::Month => a.year() == b.year() && a.month() == b.month(),
        Granularity::Quarter => a.year() == b.year() && quarter_of(a) == quarter_of(b),
        Granularity::Year => a.year() == b.year(),
    }
}

/// Quarter number 1..=4.
pub fn quarter(date: &NaiveDateTime) -> u32 {
    quarter_of(date) + 1
}

/// Absolute distance between two instants in fractional days.
pub fn diff_days(a: &NaiveDateTime, b: &NaiveDateTime) -> f64 {
    let millis = (*a - *b).num_milliseconds().abs();
    millis as f64 / 86_400_000.0
}
