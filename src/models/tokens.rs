// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credential pair.

use serde::{Deserialize, Serialize};

/// Fitbit OAuth tokens, persisted as one unit and replaced wholesale on refresh.
///
/// No expiry is tracked; an expired access token is discovered when the API
/// answers 401.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token endpoint response. Extra fields (expires_in, scope, user_id) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenRefreshResponse> for CredentialPair {
    fn from(response: TokenRefreshResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}
