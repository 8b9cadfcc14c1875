// ABOUTME: OAuth2 token model persisted to disk or passed around as a JSON string
// ABOUTME: Field names match the Go oauth2.Token layout so existing token files keep loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::oauth::DEFAULT_TOKEN_TYPE;
use crate::errors::ConnectorResult;

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_owned()
}

/// OAuth2 access/refresh token pair
///
/// A token is never edited in place: every refresh yields a new value that
/// replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Short-lived bearer token sent with API calls
    pub access_token: String,
    /// Token type, `Bearer` for this provider
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Long-lived token exchanged for new access tokens
    #[serde(default)]
    pub refresh_token: String,
    /// When the access token expires
    pub expiry: DateTime<Utc>,
}

impl Token {
    /// Parse a token from its JSON representation
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the JSON is not a token
    pub fn from_json_str(json: &str) -> ConnectorResult<Self> {
        Ok(serde_json::from_str(json.trim())?)
    }

    /// Serialize the token to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails
    pub fn to_json_pretty(&self) -> ConnectorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether a refresh token is held
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }

    /// Whether the access token has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now()
    }
}
