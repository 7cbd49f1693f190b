// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitbit Sleep Sync: copy Fitbit sleep logs into BigQuery
//!
//! This crate fetches sleep logs from the Fitbit Web API (refreshing the
//! OAuth tokens when they expire), derives per-night sleep metrics, and
//! appends rows not yet stored to a BigQuery table.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
