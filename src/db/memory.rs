// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process sleep table, used for dry runs and tests.

use crate::db::SleepTable;
use crate::error::Result;
use crate::models::SleepRow;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sleep table held in memory, keyed by log ID.
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryTable {
    rows: Arc<DashMap<u64, SleepRow>>,
    /// Total insert calls, including any that overwrote an existing key.
    inserts: Arc<AtomicU64>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, log_id: u64) -> Option<SleepRow> {
        self.rows.get(&log_id).map(|row| row.value().clone())
    }

    /// Number of insert calls that reached the table.
    pub fn insert_calls(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }
}

impl SleepTable for MemoryTable {
    async fn exists(&self, log_id: u64) -> Result<bool> {
        Ok(self.rows.contains_key(&log_id))
    }

    async fn insert(&self, row: &SleepRow) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::Relaxed);
        self.rows.insert(row.log_id, row.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, row: &SleepRow) -> Result<bool> {
        match self.rows.entry(row.log_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                self.inserts.fetch_add(1, Ordering::Relaxed);
                slot.insert(row.clone());
                Ok(true)
            }
        }
    }
}
