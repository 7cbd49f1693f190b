// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sleep sync run.
//!
//! Handles the core workflow:
//! 1. Load the stored Fitbit tokens
//! 2. Fetch sleep logs (refreshing once on an expired token)
//! 3. Derive metrics for each record
//! 4. Append records not yet in the destination table

use crate::db::SleepTable;
use crate::error::Result;
use crate::models::DateRange;
use crate::services::fitbit::FitbitService;
use crate::services::writer::SleepWriter;

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub fetched: u32,
    pub inserted: u32,
    pub skipped: u32,
}

/// Fetches sleep logs from Fitbit and writes them to a sleep table.
pub struct SleepSync<T> {
    fitbit: FitbitService,
    writer: SleepWriter<T>,
}

impl<T: SleepTable> SleepSync<T> {
    pub fn new(fitbit: FitbitService, writer: SleepWriter<T>) -> Self {
        Self { fitbit, writer }
    }

    /// Run one sync over the date range. Any error ends the run; nothing is
    /// written if the fetch fails.
    ///
    /// A refreshed token pair that could not be saved is saved again once
    /// the rows are written, and the run fails if that save fails too.
    pub async fn run(&mut self, range: &DateRange) -> Result<SyncSummary> {
        let result = self.sync_range(range).await;
        let saved = self.fitbit.save_pending();
        let summary = result?;
        saved?;
        Ok(summary)
    }

    async fn sync_range(&mut self, range: &DateRange) -> Result<SyncSummary> {
        tracing::info!(start = %range.start(), end = %range.end(), "Starting sleep sync");

        let response = self.fitbit.fetch_sleep(range).await?;
        let fetched = response.sleep.len() as u32;

        if response.sleep.is_empty() {
            tracing::info!("No sleep logs in range, nothing to write");
            return Ok(SyncSummary::default());
        }

        let written = self.writer.write_batch(&response.sleep).await?;

        let summary = SyncSummary {
            fetched,
            inserted: written.inserted,
            skipped: written.skipped,
        };

        tracing::info!(
            fetched = summary.fetched,
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Sleep sync complete"
        );

        Ok(summary)
    }
}
