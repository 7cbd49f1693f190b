// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod row;
pub mod sleep;
pub mod tokens;

pub use row::{ColumnType, SleepRow};
pub use sleep::{DateRange, SleepLevels, SleepRecord, SleepResponse, StageEntry, StageSummary};
pub use tokens::{CredentialPair, TokenRefreshResponse};
