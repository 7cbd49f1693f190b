// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::NaiveDate;
use fitbit_sleep_sync::db::TokenStore;
use fitbit_sleep_sync::models::{CredentialPair, DateRange};
use fitbit_sleep_sync::services::FitbitClient;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "23ABCD";
pub const CLIENT_SECRET: &str = "test_secret";

/// Sleep range path used by `test_range()`.
#[allow(dead_code)]
pub const SLEEP_PATH: &str = "/1.2/user/-/sleep/date/2025-07-01/2025-07-03.json";

/// Two-record sleep range response (one stages log, one classic nap).
#[allow(dead_code)]
pub const SLEEP_FIXTURE: &str = include_str!("../fixtures/sleep_range_2025-07-01_2025-07-03.json");

#[allow(dead_code)]
pub fn test_range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
    )
    .unwrap()
}

/// Create a Fitbit client that points to the mock server.
#[allow(dead_code)]
pub fn test_client(mock_server: &MockServer) -> FitbitClient {
    FitbitClient::with_urls(
        CLIENT_ID.to_string(),
        CLIENT_SECRET.to_string(),
        &mock_server.uri(),
        &format!("{}/oauth2/token", mock_server.uri()),
    )
}

/// Expected Basic auth header for the test client credentials.
#[allow(dead_code)]
pub fn basic_auth() -> String {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    format!("Basic {}", BASE64.encode(format!("{}:{}", CLIENT_ID, CLIENT_SECRET)))
}

#[allow(dead_code)]
pub fn pair(access: &str, refresh: &str) -> CredentialPair {
    CredentialPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
    }
}

/// Token store in a fresh temp dir, optionally seeded with a pair.
///
/// Keep the returned `TempDir` alive for the duration of the test.
#[allow(dead_code)]
pub fn temp_store(seed: Option<CredentialPair>) -> (tempfile::TempDir, TokenStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = TokenStore::new(dir.path().join("fitbit_tokens.json"));
    if let Some(tokens) = seed {
        store.save(&tokens).expect("Failed to seed token store");
    }
    (dir, store)
}

/// Minimal stages sleep log JSON for a single record.
#[allow(dead_code)]
pub fn sleep_record_json(log_id: u64) -> serde_json::Value {
    serde_json::json!({
        "logId": log_id,
        "dateOfSleep": "2025-07-03",
        "startTime": "2025-07-02T23:00:00.000",
        "endTime": "2025-07-03T06:00:00.000",
        "minutesAsleep": 60,
        "minutesAwake": 10,
        "timeInBed": 70,
        "efficiency": 90,
        "type": "stages",
        "isMainSleep": true,
        "levels": {
            "data": [
                {"dateTime": "2025-07-02T23:00:00.000", "level": "wake", "seconds": 720},
                {"dateTime": "2025-07-02T23:12:00.000", "level": "light", "seconds": 600}
            ],
            "summary": {
                "deep": {"count": 2, "minutes": 15, "thirtyDayAvgMinutes": 70},
                "wake": {"count": 3, "minutes": 10, "thirtyDayAvgMinutes": 40}
            }
        }
    })
}
