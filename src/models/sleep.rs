// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit sleep log models and the requested date range.

use crate::error::AppError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Fitbit rejects sleep range requests spanning more than 100 days.
pub const MAX_RANGE_DAYS: i64 = 100;

/// Response body of the sleep range endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SleepResponse {
    #[serde(default)]
    pub sleep: Vec<SleepRecord>,
}

/// One sleep session as returned by Fitbit (API version 1.2).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    /// Provider-assigned unique key, used for dedup
    pub log_id: u64,
    pub date_of_sleep: NaiveDate,
    /// Local time, e.g. `2025-07-02T23:00:00.000`
    pub start_time: String,
    pub end_time: String,
    pub minutes_asleep: u32,
    pub minutes_awake: u32,
    pub time_in_bed: u32,
    #[serde(default)]
    pub minutes_to_fall_asleep: Option<u32>,
    #[serde(default)]
    pub minutes_after_wakeup: Option<u32>,
    /// Session length in milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
    pub efficiency: u32,
    /// `stages` or `classic`
    #[serde(rename = "type")]
    pub sleep_type: String,
    pub is_main_sleep: bool,
    #[serde(default)]
    pub levels: SleepLevels,
}

/// Stage timeline plus per-stage totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SleepLevels {
    #[serde(default)]
    pub data: Vec<StageEntry>,
    #[serde(default)]
    pub summary: BTreeMap<String, StageSummary>,
}

/// One entry in the stage timeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEntry {
    pub date_time: String,
    pub level: String,
    pub seconds: u32,
}

/// Totals for one stage label.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    #[serde(default)]
    pub count: Option<u32>,
    pub minutes: u32,
    #[serde(default)]
    pub thirty_day_avg_minutes: Option<u32>,
}

impl SleepLevels {
    /// Look up the summary for a stage label (exact match).
    pub fn stage(&self, label: &str) -> Option<&StageSummary> {
        self.summary.get(label)
    }
}

/// Inclusive calendar date range for the sleep endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        let span = (end - start).num_days() + 1;
        if span > MAX_RANGE_DAYS {
            return Err(AppError::InvalidRange(format!(
                "{} days requested, at most {} allowed",
                span, MAX_RANGE_DAYS
            )));
        }

        Ok(Self { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Range of `days` days ending on `end` (inclusive).
    pub fn ending_on(end: NaiveDate, days: u32) -> Result<Self, AppError> {
        let days = i64::from(days.max(1));
        if days > MAX_RANGE_DAYS {
            return Err(AppError::InvalidRange(format!(
                "{} days requested, at most {} allowed",
                days, MAX_RANGE_DAYS
            )));
        }
        let start = end
            .checked_sub_signed(chrono::Duration::days(days - 1))
            .ok_or_else(|| AppError::InvalidRange(format!("{} days before {} is out of range", days, end)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}
