// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dedup writer: derives rows and appends the ones not yet stored.

use crate::db::SleepTable;
use crate::error::Result;
use crate::models::SleepRecord;
use crate::services::metrics::derive_row;
use chrono::Utc;

/// How the writer guards against duplicate log IDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Existence query, then a separate insert. Two concurrent runs can both
    /// pass the check and insert the same log twice.
    #[default]
    CheckThenInsert,
    /// Single insert-if-absent operation per record.
    Atomic,
}

impl std::str::FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check-then-insert" => Ok(WriteMode::CheckThenInsert),
            "atomic" => Ok(WriteMode::Atomic),
            other => Err(format!(
                "unknown write mode {:?} (expected check-then-insert or atomic)",
                other
            )),
        }
    }
}

/// Counts from writing one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: u32,
    pub skipped: u32,
}

/// Writes derived sleep rows, skipping log IDs already in the table.
pub struct SleepWriter<T> {
    table: T,
    mode: WriteMode,
}

impl<T: SleepTable> SleepWriter<T> {
    pub fn new(table: T, mode: WriteMode) -> Self {
        Self { table, mode }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Write every record in order. The first failure aborts the rest of
    /// the batch.
    pub async fn write_batch(&self, records: &[SleepRecord]) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();

        for record in records {
            if self.write_one(record).await? {
                summary.inserted += 1;
            } else {
                summary.skipped += 1;
            }
        }

        Ok(summary)
    }

    /// Returns `true` if the record was inserted, `false` if skipped.
    async fn write_one(&self, record: &SleepRecord) -> Result<bool> {
        let log_id = record.log_id;

        let inserted = match self.mode {
            WriteMode::CheckThenInsert => {
                if self.table.exists(log_id).await? {
                    false
                } else {
                    let row = derive_row(record, Utc::now())?;
                    self.table.insert(&row).await?;
                    true
                }
            }
            WriteMode::Atomic => {
                let row = derive_row(record, Utc::now())?;
                self.table.insert_if_absent(&row).await?
            }
        };

        if inserted {
            tracing::info!(log_id, date = %record.date_of_sleep, "Inserted sleep log");
        } else {
            tracing::debug!(log_id, "Sleep log already stored (skip)");
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTable;
    use crate::error::AppError;
    use crate::models::SleepLevels;
    use chrono::NaiveDate;

    fn record(log_id: u64) -> SleepRecord {
        SleepRecord {
            log_id,
            date_of_sleep: NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
            start_time: "2025-07-02T23:00:00.000".to_string(),
            end_time: "2025-07-03T06:00:00.000".to_string(),
            minutes_asleep: 380,
            minutes_awake: 40,
            time_in_bed: 420,
            minutes_to_fall_asleep: None,
            minutes_after_wakeup: None,
            duration: None,
            efficiency: 91,
            sleep_type: "stages".to_string(),
            is_main_sleep: true,
            levels: SleepLevels::default(),
        }
    }

    #[tokio::test]
    async fn test_same_log_twice_inserts_once() {
        let writer = SleepWriter::new(MemoryTable::new(), WriteMode::CheckThenInsert);

        let first = writer.write_batch(&[record(1)]).await.unwrap();
        assert_eq!(first, WriteSummary { inserted: 1, skipped: 0 });

        let second = writer.write_batch(&[record(1)]).await.unwrap();
        assert_eq!(second, WriteSummary { inserted: 0, skipped: 1 });

        assert_eq!(writer.table().len(), 1);
        assert_eq!(writer.table().insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_counts_mixed() {
        let table = MemoryTable::new();
        let writer = SleepWriter::new(table.clone(), WriteMode::CheckThenInsert);
        writer.write_batch(&[record(2)]).await.unwrap();

        let summary = writer
            .write_batch(&[record(1), record(2), record(3)])
            .await
            .unwrap();
        assert_eq!(summary, WriteSummary { inserted: 2, skipped: 1 });
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn test_atomic_mode_dedups() {
        let writer = SleepWriter::new(MemoryTable::new(), WriteMode::Atomic);
        let summary = writer
            .write_batch(&[record(5), record(5)])
            .await
            .unwrap();
        assert_eq!(summary, WriteSummary { inserted: 1, skipped: 1 });
        assert_eq!(writer.table().insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_derivation_error_aborts_rest_of_batch() {
        let writer = SleepWriter::new(MemoryTable::new(), WriteMode::CheckThenInsert);
        let mut bad = record(2);
        bad.start_time = "not a time".to_string();

        let err = writer
            .write_batch(&[record(1), bad, record(3)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Derivation(_)));
        assert!(writer.table().get(1).is_some());
        assert!(writer.table().get(3).is_none());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let writer = SleepWriter::new(MemoryTable::new(), WriteMode::CheckThenInsert);
        let summary = writer.write_batch(&[]).await.unwrap();
        assert_eq!(summary, WriteSummary::default());
    }

    #[test]
    fn test_write_mode_from_str() {
        assert_eq!("atomic".parse::<WriteMode>().unwrap(), WriteMode::Atomic);
        assert_eq!(
            "Check-Then-Insert".parse::<WriteMode>().unwrap(),
            WriteMode::CheckThenInsert
        );
        assert!("upsert".parse::<WriteMode>().is_err());
    }
}
