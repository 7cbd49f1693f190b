// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc, Weekday};

/// Parse a Fitbit local timestamp such as `2025-07-02T23:00:00.000`.
///
/// The fractional part is optional.
pub fn parse_fitbit_timestamp(value: &str) -> Option<NaiveDateTime> {
    value.parse::<NaiveDateTime>().ok()
}

/// Full English weekday name for a calendar date.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    use chrono::Datelike;

    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Format a civil timestamp the way BigQuery expects a TIMESTAMP literal.
pub fn format_bigquery_civil(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a UTC instant as a BigQuery TIMESTAMP literal with microseconds.
pub fn format_bigquery_utc(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string()
}

/// Serde serializer writing `NaiveDateTime` as a BigQuery TIMESTAMP literal.
pub mod bigquery_civil {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_bigquery_civil(*value))
    }
}

/// Serde serializer writing `DateTime<Utc>` as a BigQuery TIMESTAMP literal.
pub mod bigquery_utc {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_bigquery_utc(*value))
    }
}
