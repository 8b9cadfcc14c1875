// ABOUTME: Token agent owning the current OAuth token and refreshing it before every use
// ABOUTME: Exposes the TokenSource seam the API client depends on
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::time::Duration;

use async_trait::async_trait;
use strava_core::{CallContext, ConnectorError, ConnectorResult, Token};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::client::OAuth2Client;
use super::redirect::await_authorization_code;

/// Supplies a bearer token for each outbound call
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Token to attach to the next request
    ///
    /// # Errors
    ///
    /// Returns `TokenRefreshFailed` when no usable token can be produced
    async fn current_token(&self, ctx: &CallContext) -> ConnectorResult<Token>;
}

/// Owns one OAuth token and keeps it fresh
///
/// Every call to [`TokenSource::current_token`] exchanges the held refresh
/// token for a new access token, with no local expiry bookkeeping. The
/// returned token replaces the held one wholesale. Concurrent callers may
/// refresh concurrently; the last response to arrive wins.
#[derive(Debug)]
pub struct TokenAgent {
    client: OAuth2Client,
    token: RwLock<Option<Token>>,
}

impl TokenAgent {
    /// Agent holding an existing token, typically loaded from storage
    #[must_use]
    pub fn new(client: OAuth2Client, token: Token) -> Self {
        Self {
            client,
            token: RwLock::new(Some(token)),
        }
    }

    /// Agent with no token yet; obtain one with
    /// [`TokenAgent::exchange_authorization_code`]
    #[must_use]
    pub fn unauthenticated(client: OAuth2Client) -> Self {
        Self {
            client,
            token: RwLock::new(None),
        }
    }

    /// The OAuth client used for exchanges
    #[must_use]
    pub const fn oauth_client(&self) -> &OAuth2Client {
        &self.client
    }

    /// Copy of the held token without refreshing it
    pub async fn snapshot(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    /// Exchange a one-time authorization code for the first token
    ///
    /// # Errors
    ///
    /// Returns `TokenRefreshFailed` if the exchange fails
    pub async fn exchange_authorization_code(
        &self,
        ctx: &CallContext,
        code: &str,
    ) -> ConnectorResult<Token> {
        let token = self.client.exchange_code(ctx, code).await.inspect_err(|e| {
            warn!(error = %e, "authorization code exchange failed");
        })?;
        info!("obtained token from authorization code");
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Run the redirect listener, wait for the user to approve, then exchange
    /// the received code
    ///
    /// `limit` bounds the wait for the redirect; `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationDenied` if the user declines or the wait times
    /// out, a server error if the listener cannot start, or
    /// `TokenRefreshFailed` if the exchange fails
    pub async fn await_initial_token(
        &self,
        ctx: &CallContext,
        limit: Option<Duration>,
    ) -> ConnectorResult<Token> {
        let redirect_uri = self.client.config().redirect_uri.clone();
        let code = await_authorization_code(&redirect_uri, limit).await?;
        self.exchange_authorization_code(ctx, &code).await
    }
}

#[async_trait]
impl TokenSource for TokenAgent {
    async fn current_token(&self, ctx: &CallContext) -> ConnectorResult<Token> {
        let refresh_token = {
            let held = self.token.read().await;
            match held.as_ref() {
                Some(token) if token.has_refresh_token() => token.refresh_token.clone(),
                Some(_) => {
                    return Err(ConnectorError::token_refresh_failed(
                        "held token has no refresh token",
                    ))
                }
                None => return Err(ConnectorError::token_refresh_failed("no token held")),
            }
        };

        debug!("refreshing token before request");
        let fresh = self
            .client
            .refresh_token(ctx, &refresh_token)
            .await
            .inspect_err(|e| warn!(error = %e, "token refresh failed"))?;

        *self.token.write().await = Some(fresh.clone());
        Ok(fresh)
    }
}

/// A fixed token, never refreshed
///
/// Useful when the caller manages tokens itself.
#[derive(Debug, Clone)]
pub struct StaticToken(pub Token);

#[async_trait]
impl TokenSource for StaticToken {
    async fn current_token(&self, _ctx: &CallContext) -> ConnectorResult<Token> {
        Ok(self.0.clone())
    }
}
