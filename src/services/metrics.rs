// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-record sleep metric derivation.

use crate::error::AppError;
use crate::models::{SleepRecord, SleepRow};
use crate::time_utils::{parse_fitbit_timestamp, weekday_name};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Timeline labels that count as being asleep, matched exactly.
const SLEEP_STAGES: [&str; 4] = ["asleep", "light", "deep", "rem"];

const DEEP_STAGE: &str = "deep";
const WAKE_STAGE: &str = "wake";

/// Build the warehouse row for one sleep record.
///
/// `inserted_at` is the write timestamp stored with the row.
pub fn derive_row(record: &SleepRecord, inserted_at: DateTime<Utc>) -> Result<SleepRow, AppError> {
    let start_time = parse_timestamp(record, "startTime", &record.start_time)?;
    let end_time = parse_timestamp(record, "endTime", &record.end_time)?;

    let deep_sleep_minutes = record.levels.stage(DEEP_STAGE).map(|s| s.minutes);

    Ok(SleepRow {
        log_id: record.log_id,
        date_of_sleep: record.date_of_sleep,
        weekday: weekday_name(record.date_of_sleep).to_string(),
        start_time,
        end_time,
        minutes_asleep: record.minutes_asleep,
        minutes_awake: record.minutes_awake,
        time_in_bed: record.time_in_bed,
        minutes_to_fall_asleep: record.minutes_to_fall_asleep,
        minutes_after_wakeup: record.minutes_after_wakeup,
        efficiency: record.efficiency,
        sleep_type: record.sleep_type.clone(),
        is_main_sleep: record.is_main_sleep,
        deep_sleep_minutes,
        deep_sleep_ratio: deep_sleep_ratio(deep_sleep_minutes, record.minutes_asleep),
        wake_count: record.levels.stage(WAKE_STAGE).and_then(|s| s.count),
        sleep_latency: sleep_latency(record, start_time)?,
        inserted_at,
    })
}

/// Percent of asleep minutes spent in deep sleep.
///
/// `None` when nothing was slept, so an empty night never reads as 0%.
pub fn deep_sleep_ratio(deep_minutes: Option<u32>, minutes_asleep: u32) -> Option<f64> {
    if minutes_asleep == 0 {
        return None;
    }
    deep_minutes.map(|deep| f64::from(deep) / f64::from(minutes_asleep) * 100.0)
}

/// Minutes between the session start and the first recognized sleep stage.
fn sleep_latency(record: &SleepRecord, start_time: NaiveDateTime) -> Result<Option<f64>, AppError> {
    let Some(onset) = record
        .levels
        .data
        .iter()
        .find(|entry| SLEEP_STAGES.contains(&entry.level.as_str()))
    else {
        return Ok(None);
    };

    let onset_time = parse_timestamp(record, "levels.data.dateTime", &onset.date_time)?;
    let seconds = (onset_time - start_time).num_seconds();
    Ok(Some(seconds as f64 / 60.0))
}

fn parse_timestamp(
    record: &SleepRecord,
    field: &str,
    value: &str,
) -> Result<NaiveDateTime, AppError> {
    parse_fitbit_timestamp(value).ok_or_else(|| {
        AppError::Derivation(format!(
            "log {}: invalid {} {:?}",
            record.log_id, field, value
        ))
    })
}
