// ABOUTME: OAuth2 client for the provider's authorization-code and refresh-token grants
// ABOUTME: Builds the approval URL and talks to the token endpoint
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use strava_core::constants::oauth::{
    APPROVAL_PROMPT, DEFAULT_TOKEN_TYPE, GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN,
    RESPONSE_TYPE,
};
use strava_core::constants::strava_urls::{AUTHORIZE_PATH, OAUTH_BASE, TOKEN_PATH};
use strava_core::{CallContext, ConnectorError, ConnectorResult, Token};
use tracing::{debug, warn};
use url::Url;

use crate::utils::http_client::{apply_deadline, oauth_client};

/// OAuth 2.0 client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    /// OAuth client ID from provider
    pub client_id: String,
    /// OAuth client secret from provider
    pub client_secret: String,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Redirect URI for OAuth callbacks
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Configuration against the provider's production OAuth endpoints
    #[must_use]
    pub fn strava(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self::with_oauth_base(OAUTH_BASE, client_id, client_secret, redirect_uri, scopes)
    }

    /// Configuration against an alternative OAuth base URL
    #[must_use]
    pub fn with_oauth_base(
        oauth_base: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        let base = oauth_base.trim_end_matches('/');
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: format!("{base}/{AUTHORIZE_PATH}"),
            token_url: format!("{base}/{TOKEN_PATH}"),
            redirect_uri: redirect_uri.into(),
            scopes,
        }
    }
}

/// OAuth 2.0 client for the provider's token endpoint
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    config: OAuth2Config,
    client: Client,
}

impl OAuth2Client {
    /// Create a new `OAuth2` client with the given configuration
    #[must_use]
    pub fn new(config: OAuth2Config) -> Self {
        Self {
            config,
            client: oauth_client(),
        }
    }

    /// Create a client that reuses an existing HTTP client
    #[must_use]
    pub const fn with_http_client(config: OAuth2Config, client: Client) -> Self {
        Self { config, client }
    }

    /// Get the `OAuth2` configuration
    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// URL the user visits to approve the application
    ///
    /// Scopes are comma-joined and the approval prompt is always forced.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the authorization URL is malformed
    pub fn authorization_url(&self) -> ConnectorResult<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| ConnectorError::config(format!("invalid auth URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", RESPONSE_TYPE)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("approval_prompt", APPROVAL_PROMPT)
            .append_pair("scope", &self.config.scopes.join(","));

        Ok(url.into())
    }

    /// Exchange an authorization code for the first token
    ///
    /// # Errors
    ///
    /// Returns `TokenRefreshFailed` if the token endpoint rejects the code or
    /// cannot be reached
    pub async fn exchange_code(&self, ctx: &CallContext, code: &str) -> ConnectorResult<Token> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", GRANT_AUTHORIZATION_CODE),
        ];

        debug!("exchanging authorization code for token");
        let response = self.request_token(ctx, &params).await?;
        Ok(response.into_token(None))
    }

    /// Exchange a refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns `TokenRefreshFailed` if the token endpoint rejects the refresh
    /// token or cannot be reached
    pub async fn refresh_token(
        &self,
        ctx: &CallContext,
        refresh_token: &str,
    ) -> ConnectorResult<Token> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", GRANT_REFRESH_TOKEN),
        ];

        debug!("refreshing access token");
        let response = self.request_token(ctx, &params).await?;
        Ok(response.into_token(Some(refresh_token)))
    }

    async fn request_token(
        &self,
        ctx: &CallContext,
        params: &[(&str, &str)],
    ) -> ConnectorResult<TokenResponse> {
        let request = apply_deadline(self.client.post(&self.config.token_url).form(params), ctx);

        let response = request
            .send()
            .await
            .map_err(|e| ConnectorError::token_refresh_failed_with("token request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "token endpoint rejected the request");
            return Err(ConnectorError::token_refresh_failed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            ConnectorError::token_refresh_failed_with("token response could not be decoded", e)
        })
    }
}

/// Token endpoint response
///
/// The provider sends both an absolute `expires_at` and a relative
/// `expires_in`; the absolute value wins when present.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self, previous_refresh_token: Option<&str>) -> Token {
        let expiry = self
            .expires_at
            .and_then(|at| DateTime::from_timestamp(at, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            })
            .unwrap_or_else(Utc::now);

        // The provider may omit the refresh token when it is unchanged
        let refresh_token = self
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous_refresh_token.map(str::to_owned))
            .unwrap_or_default();

        Token {
            access_token: self.access_token,
            token_type: self
                .token_type
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned()),
            refresh_token,
            expiry,
        }
    }
}
