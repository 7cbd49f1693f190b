//! Persistence layer: credential file and destination tables.

pub mod bigquery;
pub mod memory;
pub mod token_store;

pub use bigquery::{BigQueryTable, TableRef};
pub use memory::MemoryTable;
pub use token_store::TokenStore;

use crate::error::Result;
use crate::models::SleepRow;

/// Destination table for derived sleep rows.
#[allow(async_fn_in_trait)]
pub trait SleepTable {
    /// Whether a row with this log ID is already stored.
    async fn exists(&self, log_id: u64) -> Result<bool>;

    /// Append a single row.
    async fn insert(&self, row: &SleepRow) -> Result<()>;

    /// Insert the row unless its log ID is already present, as one operation.
    ///
    /// Returns `true` if the row was inserted.
    async fn insert_if_absent(&self, row: &SleepRow) -> Result<bool>;
}
