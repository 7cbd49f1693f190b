// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived sleep row as stored in the warehouse table.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

/// Column types of the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Date,
    String,
    Timestamp,
    Float,
    Boolean,
}

impl ColumnType {
    /// GoogleSQL type name, as used in query parameters.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INT64",
            ColumnType::Date => "DATE",
            ColumnType::String => "STRING",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Float => "FLOAT64",
            ColumnType::Boolean => "BOOL",
        }
    }
}

/// One row per Fitbit sleep log, original fields plus derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepRow {
    /// Fitbit log ID (dedup key)
    pub log_id: u64,
    pub date_of_sleep: NaiveDate,
    /// English weekday name of `date_of_sleep`
    pub weekday: String,
    #[serde(with = "crate::time_utils::bigquery_civil")]
    pub start_time: NaiveDateTime,
    #[serde(with = "crate::time_utils::bigquery_civil")]
    pub end_time: NaiveDateTime,
    pub minutes_asleep: u32,
    pub minutes_awake: u32,
    pub time_in_bed: u32,
    pub minutes_to_fall_asleep: Option<u32>,
    pub minutes_after_wakeup: Option<u32>,
    pub efficiency: u32,
    pub sleep_type: String,
    pub is_main_sleep: bool,
    pub deep_sleep_minutes: Option<u32>,
    /// Percent of asleep minutes spent in deep sleep
    pub deep_sleep_ratio: Option<f64>,
    pub wake_count: Option<u32>,
    /// Minutes from session start to the first recognized sleep stage
    pub sleep_latency: Option<f64>,
    #[serde(with = "crate::time_utils::bigquery_utc")]
    pub inserted_at: DateTime<Utc>,
}

impl SleepRow {
    /// Destination table columns, in insertion order.
    pub const SCHEMA: &'static [(&'static str, ColumnType)] = &[
        ("log_id", ColumnType::Integer),
        ("date_of_sleep", ColumnType::Date),
        ("weekday", ColumnType::String),
        ("start_time", ColumnType::Timestamp),
        ("end_time", ColumnType::Timestamp),
        ("minutes_asleep", ColumnType::Integer),
        ("minutes_awake", ColumnType::Integer),
        ("time_in_bed", ColumnType::Integer),
        ("minutes_to_fall_asleep", ColumnType::Integer),
        ("minutes_after_wakeup", ColumnType::Integer),
        ("efficiency", ColumnType::Integer),
        ("sleep_type", ColumnType::String),
        ("is_main_sleep", ColumnType::Boolean),
        ("deep_sleep_minutes", ColumnType::Integer),
        ("deep_sleep_ratio", ColumnType::Float),
        ("wake_count", ColumnType::Integer),
        ("sleep_latency", ColumnType::Float),
        ("inserted_at", ColumnType::Timestamp),
    ];
}
