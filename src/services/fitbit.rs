// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit Web API client for fetching sleep logs.
//!
//! Handles:
//! - Sleep log fetching for a date range
//! - Token refresh via the Basic-Auth protected token endpoint
//! - Classifying 401 responses as an expired access token

use crate::error::AppError;
use crate::models::{CredentialPair, DateRange, SleepResponse, TokenRefreshResponse};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;

pub const FITBIT_API_URL: &str = "https://api.fitbit.com";
pub const FITBIT_TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";

/// Fitbit API client.
#[derive(Clone)]
pub struct FitbitClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl FitbitClient {
    /// Create a new Fitbit client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_urls(client_id, client_secret, FITBIT_API_URL, FITBIT_TOKEN_URL)
    }

    /// Create a client against custom endpoints (mock servers, proxies).
    pub fn with_urls(
        client_id: String,
        client_secret: String,
        base_url: &str,
        token_url: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            client_id,
            client_secret,
        }
    }

    /// `Basic base64(client_id:client_secret)`
    fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(credentials))
    }

    /// Exchange a refresh token for a new credential pair. Single attempt.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<CredentialPair, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth_header())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::FitbitApi(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Fitbit token refresh failed");
            return Err(AppError::AuthRefreshFailed {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: TokenRefreshResponse = response.json().await.map_err(|e| {
            AppError::FitbitApi(format!("Failed to parse token response: {}", e))
        })?;

        Ok(tokens.into())
    }

    /// Fetch all sleep logs in the (inclusive) date range.
    pub async fn get_sleep_range(
        &self,
        access_token: &str,
        range: &DateRange,
    ) -> Result<SleepResponse, AppError> {
        let url = format!(
            "{}/1.2/user/-/sleep/date/{}/{}.json",
            self.base_url,
            range.start().format("%Y-%m-%d"),
            range.end().format("%Y-%m-%d")
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::FitbitApi(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Fitbit rejected access token (401)");
            return Err(AppError::AuthExpired);
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Fitbit sleep fetch failed");
            return Err(AppError::FetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::FitbitApi(format!("JSON parse error: {}", e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FitbitService - token lifecycle around the raw client
// ─────────────────────────────────────────────────────────────────────────────

use crate::db::TokenStore;

/// Bounded retry policy for expired access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Refreshes allowed per fetch. After the budget is spent another 401 is
    /// terminal.
    pub max_refreshes: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_refreshes: 1 }
    }
}

/// Fitbit service that owns the credential pair and keeps it persisted.
pub struct FitbitService {
    client: FitbitClient,
    store: TokenStore,
    tokens: CredentialPair,
    policy: RetryPolicy,
    /// Refreshed pair not yet written to the store
    unsaved: bool,
}

impl FitbitService {
    /// Load the stored credential pair. A missing file yields empty tokens;
    /// the first fetch then fails with 401 and goes through a refresh.
    pub fn load(client: FitbitClient, store: TokenStore) -> Result<Self, AppError> {
        let tokens = match store.load()? {
            Some(tokens) => tokens,
            None => {
                tracing::warn!(
                    path = %store.path().display(),
                    "No stored Fitbit tokens, continuing with empty access token"
                );
                CredentialPair::default()
            }
        };

        Ok(Self {
            client,
            store,
            tokens,
            policy: RetryPolicy::default(),
            unsaved: false,
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current credential pair.
    pub fn tokens(&self) -> &CredentialPair {
        &self.tokens
    }

    /// Refresh the credential pair and persist it (full overwrite).
    ///
    /// Fitbit invalidates the old refresh token as soon as the refresh
    /// succeeds, so the new pair is kept even if the save fails. The save is
    /// retried by [`FitbitService::save_pending`].
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        self.tokens = self.client.refresh_token(&self.tokens.refresh_token).await?;

        match self.store.save(&self.tokens) {
            Ok(()) => {
                self.unsaved = false;
                tracing::info!("Fitbit tokens refreshed and saved");
            }
            Err(e) => {
                self.unsaved = true;
                tracing::warn!(
                    error = %e,
                    path = %self.store.path().display(),
                    "Fitbit tokens refreshed but not saved, continuing with new tokens"
                );
            }
        }
        Ok(())
    }

    /// Retry saving a refreshed pair whose earlier save failed.
    pub fn save_pending(&mut self) -> Result<(), AppError> {
        if self.unsaved {
            self.store.save(&self.tokens)?;
            self.unsaved = false;
            tracing::info!("Refreshed Fitbit tokens saved");
        }
        Ok(())
    }

    /// Fetch sleep logs, refreshing the access token on 401 within the
    /// retry budget.
    pub async fn fetch_sleep(&mut self, range: &DateRange) -> Result<SleepResponse, AppError> {
        let mut refreshes = 0;

        loop {
            let result = self
                .client
                .get_sleep_range(&self.tokens.access_token, range)
                .await;

            match result {
                Ok(response) => {
                    tracing::info!(
                        start = %range.start(),
                        end = %range.end(),
                        records = response.sleep.len(),
                        "Fetched sleep logs"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_auth_expired() && refreshes < self.policy.max_refreshes => {
                    refreshes += 1;
                    tracing::info!(attempt = refreshes, "Access token expired, refreshing");
                    self.refresh().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
