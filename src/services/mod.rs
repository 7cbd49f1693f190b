// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod fitbit;
pub mod metrics;
pub mod sync;
pub mod writer;

pub use fitbit::{FitbitClient, FitbitService, RetryPolicy};
pub use metrics::derive_row;
pub use sync::{SleepSync, SyncSummary};
pub use writer::{SleepWriter, WriteMode, WriteSummary};
