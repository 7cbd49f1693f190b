// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BigQuery destination table, spoken to over the REST API.
//!
//! Provides:
//! - Existence checks by log ID (parameterized query)
//! - Single-row appends (`tabledata.insertAll`)
//! - Atomic insert-if-absent (`MERGE` DML)

use crate::db::SleepTable;
use crate::error::{AppError, Result};
use crate::models::{ColumnType, SleepRow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const BIGQUERY_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// How long the `jobs.query` call waits for a result before giving up.
const QUERY_TIMEOUT_MS: u64 = 10_000;

/// Fully qualified destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    /// Parse `dataset.table` or `project.dataset.table`.
    ///
    /// The two-part form uses `default_project`.
    pub fn parse(value: &str, default_project: &str) -> Option<Self> {
        let parts: Vec<&str> = value.trim().split('.').collect();
        let (project, dataset, table) = match parts.as_slice() {
            [dataset, table] => (default_project, *dataset, *table),
            [project, dataset, table] => (*project, *dataset, *table),
            _ => return None,
        };

        if ![project, dataset, table].iter().all(|p| is_identifier(p)) {
            return None;
        }

        Some(Self {
            project_id: project.to_string(),
            dataset_id: dataset.to_string(),
            table_id: table.to_string(),
        })
    }

    /// Backtick-quoted name for use in GoogleSQL.
    pub fn sql_name(&self) -> String {
        format!("`{}`", self)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

fn is_identifier(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// BigQuery table client.
#[derive(Clone)]
pub struct BigQueryTable {
    http: reqwest::Client,
    base_url: String,
    table: TableRef,
    /// `None` when talking to the emulator or a test server.
    auth: Option<Arc<gcloud_sdk::GoogleAuthTokenGenerator>>,
}

impl BigQueryTable {
    /// Create a client using Application Default Credentials.
    ///
    /// For local development with the emulator, set BIGQUERY_EMULATOR_HOST.
    pub async fn new(table: TableRef) -> Result<Self> {
        if let Ok(host) = std::env::var("BIGQUERY_EMULATOR_HOST") {
            tracing::info!(host = %host, "Using unauthenticated connection for BigQuery emulator");
            return Ok(Self::with_base_url(
                format!("http://{}/bigquery/v2", host),
                table,
            ));
        }

        let auth = gcloud_sdk::GoogleAuthTokenGenerator::new(
            gcloud_sdk::TokenSourceType::Default,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        )
        .await
        .map_err(|e| AppError::Warehouse(format!("Failed to load Google credentials: {}", e)))?;

        tracing::info!(table = %table, "Connected to BigQuery");

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: BIGQUERY_API_URL.to_string(),
            table,
            auth: Some(Arc::new(auth)),
        })
    }

    /// Create an unauthenticated client against a custom endpoint.
    pub fn with_base_url(base_url: impl Into<String>, table: TableRef) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table,
            auth: None,
        }
    }

    /// Run a parameterized GoogleSQL statement and wait for its result.
    async fn run_query(
        &self,
        query: String,
        parameters: Vec<QueryParameter>,
    ) -> Result<QueryResponse> {
        let url = format!("{}/projects/{}/queries", self.base_url, self.table.project_id);
        let request = QueryRequest {
            query,
            use_legacy_sql: false,
            parameter_mode: "NAMED",
            query_parameters: parameters,
            timeout_ms: QUERY_TIMEOUT_MS,
        };

        let response: QueryResponse = self.post_json(&url, &request).await?;

        if let Some(error) = response.errors.first() {
            return Err(AppError::Warehouse(format!(
                "Query failed: {} ({})",
                error.message, error.reason
            )));
        }
        if !response.job_complete {
            return Err(AppError::Warehouse(format!(
                "Query did not complete within {} ms",
                QUERY_TIMEOUT_MS
            )));
        }

        Ok(response)
    }

    /// POST a JSON body and parse the JSON response.
    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let mut request = self.http.post(url).json(body);

        if let Some(auth) = &self.auth {
            let token = auth
                .create_token()
                .await
                .map_err(|e| AppError::Warehouse(format!("Failed to obtain access token: {}", e)))?;
            request = request.header(reqwest::header::AUTHORIZATION, token.header_value());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Warehouse(format!("BigQuery request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Warehouse(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Warehouse(format!("JSON parse error: {}", e)))
    }

    fn merge_statement(&self) -> String {
        let columns: Vec<String> = SleepRow::SCHEMA
            .iter()
            .map(|(name, _)| format!("@{} AS {}", name, name))
            .collect();

        format!(
            "MERGE {} T USING (SELECT {}) S ON T.log_id = S.log_id \
             WHEN NOT MATCHED THEN INSERT ROW",
            self.table.sql_name(),
            columns.join(", ")
        )
    }
}

impl SleepTable for BigQueryTable {
    async fn exists(&self, log_id: u64) -> Result<bool> {
        let query = format!(
            "SELECT COUNT(*) AS n FROM {} WHERE log_id = @log_id",
            self.table.sql_name()
        );
        let parameters = vec![QueryParameter::new(
            "log_id",
            ColumnType::Integer,
            Some(log_id.to_string()),
        )];

        let response = self.run_query(query, parameters).await?;
        let count = response
            .rows
            .first()
            .and_then(|row| row.f.first())
            .and_then(|cell| cell.v.as_str())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| AppError::Warehouse("Unexpected count query response".to_string()))?;

        Ok(count > 0)
    }

    async fn insert(&self, row: &SleepRow) -> Result<()> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            self.base_url, self.table.project_id, self.table.dataset_id, self.table.table_id
        );
        let request = InsertAllRequest {
            rows: vec![InsertRow {
                insert_id: row.log_id.to_string(),
                json: row,
            }],
        };

        let response: InsertAllResponse = self.post_json(&url, &request).await?;

        if !response.insert_errors.is_empty() {
            let messages: Vec<String> = response
                .insert_errors
                .iter()
                .flat_map(|e| e.errors.iter())
                .map(|e| format!("{}: {}", e.reason, e.message))
                .collect();
            return Err(AppError::Warehouse(format!(
                "Insert of log {} rejected: {}",
                row.log_id,
                messages.join("; ")
            )));
        }

        Ok(())
    }

    async fn insert_if_absent(&self, row: &SleepRow) -> Result<bool> {
        let response = self
            .run_query(self.merge_statement(), row_parameters(row)?)
            .await?;

        let affected = response
            .num_dml_affected_rows
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| AppError::Warehouse("MERGE response missing affected rows".to_string()))?;

        Ok(affected > 0)
    }
}

/// Build one named query parameter per column of the row.
fn row_parameters(row: &SleepRow) -> Result<Vec<QueryParameter>> {
    let value = serde_json::to_value(row)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode row: {}", e)))?;

    Ok(SleepRow::SCHEMA
        .iter()
        .map(|(name, column_type)| {
            let literal = match &value[*name] {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            QueryParameter::new(name, *column_type, literal)
        })
        .collect())
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    query: String,
    use_legacy_sql: bool,
    parameter_mode: &'static str,
    query_parameters: Vec<QueryParameter>,
    timeout_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryParameter {
    name: String,
    parameter_type: ParameterType,
    parameter_value: ParameterValue,
}

impl QueryParameter {
    fn new(name: &str, column_type: ColumnType, value: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            parameter_type: ParameterType {
                kind: column_type.sql_type(),
            },
            parameter_value: ParameterValue { value },
        }
    }
}

#[derive(Debug, Serialize)]
struct ParameterType {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// A missing `value` is a typed NULL.
#[derive(Debug, Serialize)]
struct ParameterValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    rows: Vec<TableRow>,
    #[serde(default)]
    num_dml_affected_rows: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct InsertAllRequest<'a> {
    rows: Vec<InsertRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertRow<'a> {
    /// Best-effort streaming dedup key
    insert_id: String,
    json: &'a SleepRow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<InsertError>,
}

#[derive(Debug, Deserialize)]
struct InsertError {
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}
