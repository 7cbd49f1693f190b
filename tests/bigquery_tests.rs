// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BigQuery table client tests against a wiremock server.

use chrono::{NaiveDate, Utc};
use fitbit_sleep_sync::db::{BigQueryTable, SleepTable, TableRef};
use fitbit_sleep_sync::error::AppError;
use fitbit_sleep_sync::models::SleepRow;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERIES_PATH: &str = "/projects/test-project/queries";
const INSERT_PATH: &str = "/projects/test-project/datasets/health/tables/sleep_logs/insertAll";

fn test_table(mock_server: &MockServer) -> BigQueryTable {
    BigQueryTable::with_base_url(
        mock_server.uri(),
        TableRef::parse("health.sleep_logs", "test-project").unwrap(),
    )
}

fn test_row(log_id: u64) -> SleepRow {
    SleepRow {
        log_id,
        date_of_sleep: NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
        weekday: "Thursday".to_string(),
        start_time: "2025-07-02T23:00:00".parse().unwrap(),
        end_time: "2025-07-03T06:30:00".parse().unwrap(),
        minutes_asleep: 360,
        minutes_awake: 90,
        time_in_bed: 450,
        minutes_to_fall_asleep: Some(0),
        minutes_after_wakeup: Some(0),
        efficiency: 93,
        sleep_type: "stages".to_string(),
        is_main_sleep: true,
        deep_sleep_minutes: Some(90),
        deep_sleep_ratio: Some(25.0),
        wake_count: None,
        sleep_latency: Some(12.0),
        inserted_at: Utc::now(),
    }
}

fn count_response(count: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "kind": "bigquery#queryResponse",
        "schema": {"fields": [{"name": "n", "type": "INTEGER", "mode": "NULLABLE"}]},
        "jobReference": {"projectId": "test-project", "jobId": "job_1", "location": "US"},
        "totalRows": "1",
        "rows": [{"f": [{"v": count}]}],
        "jobComplete": true,
        "cacheHit": false
    }))
}

mod exists_tests {
    use super::*;

    #[tokio::test]
    async fn test_exists_true() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .and(body_string_contains("WHERE log_id = @log_id"))
            .and(body_string_contains("`test-project.health.sleep_logs`"))
            .and(body_string_contains(r#""useLegacySql":false"#))
            .and(body_string_contains(r#""value":"42""#))
            .respond_with(count_response("1"))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert!(test_table(&mock_server).exists(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .respond_with(count_response("0"))
            .mount(&mock_server)
            .await;

        assert!(!test_table(&mock_server).exists(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_incomplete_job_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "bigquery#queryResponse",
                "jobComplete": false
            })))
            .mount(&mock_server)
            .await;

        let err = test_table(&mock_server).exists(42).await.unwrap_err();
        assert!(matches!(err, AppError::Warehouse(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_warehouse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error":{"code":403,"message":"Access Denied","status":"PERMISSION_DENIED"}}"#,
            ))
            .mount(&mock_server)
            .await;

        let err = test_table(&mock_server).exists(42).await.unwrap_err();
        match err {
            AppError::Warehouse(msg) => assert!(msg.contains("Access Denied")),
            other => panic!("expected Warehouse error, got {:?}", other),
        }
    }
}

mod insert_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_single_row() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(INSERT_PATH))
            .and(body_string_contains(r#""insertId":"42""#))
            .and(body_string_contains(r#""start_time":"2025-07-02 23:00:00""#))
            .and(body_string_contains(r#""deep_sleep_ratio":25.0"#))
            .and(body_string_contains(r#""wake_count":null"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "bigquery#tableDataInsertAllResponse"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        test_table(&mock_server)
            .insert(&test_row(42))
            .await
            .expect("Insert should succeed");
    }

    #[tokio::test]
    async fn test_insert_errors_are_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(INSERT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "bigquery#tableDataInsertAllResponse",
                "insertErrors": [{
                    "index": 0,
                    "errors": [{
                        "reason": "invalid",
                        "location": "sleep_latency",
                        "message": "no such field: sleep_latency."
                    }]
                }]
            })))
            .mount(&mock_server)
            .await;

        let err = test_table(&mock_server).insert(&test_row(42)).await.unwrap_err();
        match err {
            AppError::Warehouse(msg) => {
                assert!(msg.contains("log 42"));
                assert!(msg.contains("no such field"));
            }
            other => panic!("expected Warehouse error, got {:?}", other),
        }
    }
}

mod merge_tests {
    use super::*;

    fn dml_response(affected: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "bigquery#queryResponse",
            "jobComplete": true,
            "numDmlAffectedRows": affected,
            "dmlStats": {"insertedRowCount": affected}
        }))
    }

    #[tokio::test]
    async fn test_insert_if_absent_inserted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .and(body_string_contains("MERGE `test-project.health.sleep_logs` T"))
            .and(body_string_contains(r#""name":"deep_sleep_ratio""#))
            .and(body_string_contains(r#""type":"FLOAT64""#))
            .respond_with(dml_response("1"))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert!(test_table(&mock_server)
            .insert_if_absent(&test_row(42))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_insert_if_absent_already_present() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .respond_with(dml_response("0"))
            .mount(&mock_server)
            .await;

        assert!(!test_table(&mock_server)
            .insert_if_absent(&test_row(42))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_query_errors_are_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(QUERIES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jobComplete": true,
                "errors": [{"reason": "invalidQuery", "message": "Unrecognized name: log_id"}]
            })))
            .mount(&mock_server)
            .await;

        let err = test_table(&mock_server)
            .insert_if_absent(&test_row(42))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Warehouse(_)));
    }
}
