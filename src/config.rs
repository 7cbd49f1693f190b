//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is loaded first if present.

use crate::db::TableRef;
use crate::models::DateRange;
use crate::services::fitbit::{FITBIT_API_URL, FITBIT_TOKEN_URL};
use crate::services::WriteMode;
use chrono::{NaiveDate, Utc};
use std::env;
use std::path::PathBuf;

const DEFAULT_TOKEN_FILE: &str = "fitbit_tokens.json";
const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Fitbit ---
    /// Fitbit OAuth client ID
    pub fitbit_client_id: String,
    /// Fitbit OAuth client secret
    pub fitbit_client_secret: String,
    pub fitbit_api_url: String,
    pub fitbit_token_url: String,
    /// Where the access/refresh token pair is persisted
    pub token_file: PathBuf,

    // --- Warehouse ---
    /// GCP project ID (default project for the table reference)
    pub gcp_project_id: String,
    /// Destination table; `None` only in dry-run mode
    pub table: Option<TableRef>,
    pub write_mode: WriteMode,
    /// Write rows to an in-memory table instead of BigQuery
    pub dry_run: bool,

    // --- Run ---
    pub date_range: DateRange,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        let day = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap_or(NaiveDate::MIN);
        Self {
            fitbit_client_id: "test_client_id".to_string(),
            fitbit_client_secret: "test_secret".to_string(),
            fitbit_api_url: FITBIT_API_URL.to_string(),
            fitbit_token_url: FITBIT_TOKEN_URL.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            gcp_project_id: "test-project".to_string(),
            table: TableRef::parse("health.sleep_logs", "test-project"),
            write_mode: WriteMode::CheckThenInsert,
            dry_run: false,
            date_range: DateRange::single_day(day),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());
        let dry_run = parse_bool(env::var("SLEEP_DRY_RUN").ok().as_deref());

        let table = match env::var("BIGQUERY_TABLE") {
            Ok(value) => Some(TableRef::parse(&value, &gcp_project_id).ok_or_else(|| {
                ConfigError::Invalid(
                    "BIGQUERY_TABLE",
                    format!("expected dataset.table or project.dataset.table, got {:?}", value),
                )
            })?),
            Err(_) if dry_run => None,
            Err(_) => return Err(ConfigError::Missing("BIGQUERY_TABLE")),
        };

        let write_mode = match env::var("SLEEP_WRITE_MODE") {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::Invalid("SLEEP_WRITE_MODE", e))?,
            Err(_) => WriteMode::default(),
        };

        Ok(Self {
            fitbit_client_id: env::var("FITBIT_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FITBIT_CLIENT_ID"))?,
            fitbit_client_secret: env::var("FITBIT_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FITBIT_CLIENT_SECRET"))?,
            fitbit_api_url: env::var("FITBIT_API_URL")
                .unwrap_or_else(|_| FITBIT_API_URL.to_string()),
            fitbit_token_url: env::var("FITBIT_TOKEN_URL")
                .unwrap_or_else(|_| FITBIT_TOKEN_URL.to_string()),
            token_file: env::var("FITBIT_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE)),
            gcp_project_id,
            table,
            write_mode,
            dry_run,
            date_range: date_range_from_env(Utc::now().date_naive())?,
        })
    }
}

/// Build the date range from SLEEP_START_DATE / SLEEP_END_DATE /
/// SLEEP_LOOKBACK_DAYS, with `today` as the default end.
fn date_range_from_env(today: NaiveDate) -> Result<DateRange, ConfigError> {
    let end = match env::var("SLEEP_END_DATE") {
        Ok(value) => parse_date("SLEEP_END_DATE", &value)?,
        Err(_) => today,
    };

    match env::var("SLEEP_START_DATE") {
        Ok(value) => DateRange::new(parse_date("SLEEP_START_DATE", &value)?, end)
            .map_err(|e| ConfigError::Invalid("SLEEP_START_DATE", e.to_string())),
        Err(_) => {
            let days: u32 = match env::var("SLEEP_LOOKBACK_DAYS") {
                Ok(value) => value.trim().parse().map_err(|_| {
                    ConfigError::Invalid("SLEEP_LOOKBACK_DAYS", format!("not a number: {:?}", value))
                })?,
                Err(_) => DEFAULT_LOOKBACK_DAYS,
            };
            DateRange::ending_on(end, days)
                .map_err(|e| ConfigError::Invalid("SLEEP_LOOKBACK_DAYS", e.to_string()))
        }
    }
}

fn parse_date(var: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| ConfigError::Invalid(var, format!("{:?}: {}", value, e)))
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
