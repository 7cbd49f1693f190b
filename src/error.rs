// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

/// Application error type for a sync run.
///
/// Every variant is terminal for the current run; the binary logs it and
/// exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Fitbit access token expired")]
    AuthExpired,

    #[error("Fitbit token refresh failed with status {status}: {body}")]
    AuthRefreshFailed { status: u16, body: String },

    #[error("Fitbit sleep fetch failed with status {status}: {body}")]
    FetchFailed { status: u16, body: String },

    #[error("Fitbit API error: {0}")]
    FitbitApi(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Warehouse error: {0}")]
    Warehouse(String),

    #[error("Failed to derive sleep metrics: {0}")]
    Derivation(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the error means the access token was rejected and a refresh
    /// may help.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::AuthExpired)
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AuthExpired => "auth_expired",
            AppError::AuthRefreshFailed { .. } => "auth_refresh_failed",
            AppError::FetchFailed { .. } => "fetch_failed",
            AppError::FitbitApi(_) => "fitbit_api",
            AppError::TokenStore(_) => "token_store",
            AppError::Warehouse(_) => "warehouse",
            AppError::Derivation(_) => "derivation",
            AppError::InvalidRange(_) => "invalid_range",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
