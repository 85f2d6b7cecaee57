// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SecondsFormat, Utc};

/// Calendar date format used as diary and weight document IDs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Document ID of the form `<prefix>_<unix millis>`.
pub fn millis_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}_{}", now.timestamp_millis())
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date of `now` in the diary's local offset.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Wall-clock `HH:MM` of `now` in the diary's local offset.
pub fn local_time_hhmm(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).format("%H:%M").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// The `days` calendar dates ending at `end`, oldest first.
pub fn trailing_dates(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64)
        .rev()
        .map(|back| end - Duration::days(back))
        .collect()
}
