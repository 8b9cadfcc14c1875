// ABOUTME: Webhook subscription lifecycle: local server, creation handshake, view and delete
// ABOUTME: Tracks each attempt through an observable state machine
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use reqwest::Client;
use serde_json::json;
use strava_core::constants::strava_urls::{API_BASE, PUSH_SUBSCRIPTIONS_PATH};
use strava_core::constants::webhook::{
    DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_SERVER_URL, DEFAULT_VERIFY_TOKEN, STATUS_PATH,
};
use strava_core::{
    CallContext, ConnectorError, ConnectorResult, SubscriptionChallenge, SubscriptionCreated,
};
use tokio::sync::{oneshot, watch};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use super::handler::EventHandler;
use super::rendezvous::ChallengeSlot;
use super::routes::{webhook_router, WebhookState};
use crate::server::{bind_address, route_path, spawn_server, ServerHandle};
use crate::utils::http_client::{api_client, apply_deadline, ensure_success};

/// Progress of a subscription attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No attempt has started
    Idle,
    /// The local callback server is listening
    ServerStarted,
    /// The creation request went out; waiting for the verification GET
    AwaitingChallenge,
    /// The verification GET arrived with the right token
    ChallengeReceived,
    /// The provider returned the subscription id
    SubscriptionConfirmed {
        /// Id of the new subscription
        id: i64,
    },
    /// The attempt failed; the listener has been shut down
    Failed {
        /// What went wrong
        reason: String,
    },
}

/// Settings for the webhook server and the subscription endpoints
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Application client id
    pub client_id: String,
    /// Application client secret
    pub client_secret: String,
    /// Public URL the provider calls; its path is the local route
    pub callback_url: String,
    /// Where the local server listens, e.g. `http://localhost:8086`
    pub server_url: String,
    /// Shared secret the provider echoes back during verification
    pub verify_token: String,
    /// Provider API base URL
    pub api_base_url: String,
    /// Wait limit for the handshake when the caller sets no deadline
    pub handshake_timeout: Duration,
}

impl WebhookConfig {
    /// Configuration with the default server URL, verify token, and API base
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            server_url: DEFAULT_SERVER_URL.to_owned(),
            verify_token: DEFAULT_VERIFY_TOKEN.to_owned(),
            api_base_url: API_BASE.to_owned(),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
        }
    }

    fn subscriptions_url(&self) -> String {
        format!(
            "{}/{PUSH_SUBSCRIPTIONS_PATH}",
            self.api_base_url.trim_end_matches('/')
        )
    }
}

/// Runs the webhook callback server and manages the push subscription
///
/// Only one [`WebhookCoordinator::create_subscription`] may be in flight per
/// coordinator; a concurrent second attempt is rejected.
pub struct WebhookCoordinator {
    config: WebhookConfig,
    http: Client,
    handler: Option<Arc<dyn EventHandler>>,
    challenges: Arc<ChallengeSlot>,
    state: watch::Sender<SubscriptionState>,
}

impl WebhookCoordinator {
    /// Coordinator without an event handler; events are logged and dropped
    #[must_use]
    pub fn new(config: WebhookConfig) -> Self {
        let (state, _) = watch::channel(SubscriptionState::Idle);
        Self {
            config,
            http: api_client(),
            handler: None,
            challenges: Arc::new(ChallengeSlot::new()),
            state,
        }
    }

    /// Register the handler spawned for each delivered event
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Current state of the latest subscription attempt
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SubscriptionState) {
        debug!(state = ?next, "subscription state changed");
        self.state.send_replace(next);
    }

    /// Router serving the callback path and `/status`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the callback URL is unusable or its
    /// path collides with `/status`
    pub fn router(&self) -> ConnectorResult<Router> {
        let path = route_path(&self.config.callback_url)?;
        if path == STATUS_PATH {
            return Err(ConnectorError::config(format!(
                "callback path cannot be {STATUS_PATH}"
            )));
        }
        let state = WebhookState::new(
            &self.config.verify_token,
            Arc::clone(&self.challenges),
            self.handler.clone(),
        );
        Ok(webhook_router(&path, state))
    }

    /// Start the callback server without creating a subscription
    ///
    /// Use this when a subscription already exists.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unusable URLs, or a server error if
    /// the listener cannot be bound
    pub async fn launch_webhook_server(&self) -> ConnectorResult<ServerHandle> {
        let router = self.router()?;
        let bind = bind_address(&self.config.server_url)?;
        info!(
            address = %bind,
            callback_url = %self.config.callback_url,
            "launching webhook server"
        );
        spawn_server(&bind, router).await
    }

    /// Create a push subscription and keep the callback server running
    ///
    /// Starts the server, posts the creation request, and waits for the
    /// provider's verification GET before reading the subscription id. The
    /// wait is bounded by the deadline in `ctx`, or the configured handshake
    /// timeout when `ctx` has none.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionHandshakeFailed` if another attempt is pending,
    /// the request fails, the challenge does not arrive in time, or the
    /// provider's answer carries no id. The server is shut down in each case.
    pub async fn create_subscription(
        &self,
        ctx: &CallContext,
    ) -> ConnectorResult<(i64, ServerHandle)> {
        let deadline = ctx
            .deadline()
            .unwrap_or_else(|| Instant::now() + self.config.handshake_timeout);
        let challenge = self.challenges.arm()?;

        let server = match self.launch_webhook_server().await {
            Ok(server) => server,
            Err(e) => {
                self.challenges.disarm();
                self.transition(SubscriptionState::Failed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        self.transition(SubscriptionState::ServerStarted);

        match self.handshake(deadline, challenge).await {
            Ok(id) => {
                info!(subscription_id = id, "subscription created");
                self.transition(SubscriptionState::SubscriptionConfirmed { id });
                Ok((id, server))
            }
            Err(e) => {
                error!(error = %e, "subscription attempt failed");
                self.challenges.disarm();
                self.transition(SubscriptionState::Failed {
                    reason: e.to_string(),
                });
                if let Err(shutdown_error) = server.shutdown().await {
                    warn!(error = %shutdown_error, "webhook server did not stop cleanly");
                }
                Err(e)
            }
        }
    }

    async fn handshake(
        &self,
        deadline: Instant,
        challenge: oneshot::Receiver<SubscriptionChallenge>,
    ) -> ConnectorResult<i64> {
        let payload = json!({
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "callback_url": self.config.callback_url,
            "verify_token": self.config.verify_token,
        });

        self.transition(SubscriptionState::AwaitingChallenge);
        let request = self
            .http
            .post(self.config.subscriptions_url())
            .json(&payload);
        let response = apply_deadline(request, &CallContext::with_deadline(deadline))
            .send()
            .await
            .map_err(|e| {
                ConnectorError::handshake_failed(format!("creation request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ConnectorError::handshake_failed(format!("unable to read creation response: {e}"))
        })?;
        if !status.is_success() {
            warn!(%status, "provider rejected the subscription request");
        }

        debug!("awaiting verification challenge");
        match timeout_at(deadline, challenge).await {
            Ok(Ok(_)) => self.transition(SubscriptionState::ChallengeReceived),
            Ok(Err(_)) => {
                return Err(ConnectorError::handshake_failed(
                    "challenge channel closed before a challenge arrived",
                ))
            }
            Err(_) if status.is_success() => {
                return Err(ConnectorError::handshake_failed(
                    "no verification challenge arrived before the deadline",
                ))
            }
            Err(_) => {
                return Err(ConnectorError::handshake_failed(format!(
                    "no verification challenge arrived before the deadline; provider answered {status}: {body}"
                )))
            }
        }

        if !status.is_success() {
            return Err(ConnectorError::handshake_failed(format!(
                "provider answered {status}: {body}"
            )));
        }

        let created: SubscriptionCreated = serde_json::from_str(&body).map_err(|e| {
            ConnectorError::handshake_failed(format!(
                "unable to read subscription id, the subscription may still exist: {e}"
            ))
        })?;
        Ok(created.id)
    }

    /// Raw description of the application's current subscription
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on 404, otherwise `RequestFailed`
    pub async fn view_subscription(&self, ctx: &CallContext) -> ConnectorResult<String> {
        debug!("viewing subscription");
        let request = self
            .http
            .get(self.config.subscriptions_url())
            .query(&self.credentials());
        let response = apply_deadline(request, ctx).send().await?;
        Ok(ensure_success(response, "subscription").await?.text().await?)
    }

    /// Delete a subscription and return the provider's raw answer
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on 404, otherwise `RequestFailed`
    pub async fn delete_subscription(
        &self,
        ctx: &CallContext,
        subscription_id: i64,
    ) -> ConnectorResult<String> {
        debug!(subscription_id, "deleting subscription");
        let url = format!("{}/{subscription_id}", self.config.subscriptions_url());
        let request = self.http.delete(url).query(&self.credentials());
        let response = apply_deadline(request, ctx).send().await?;
        let resource = format!("subscription {subscription_id}");
        Ok(ensure_success(response, &resource).await?.text().await?)
    }

    fn credentials(&self) -> [(&'static str, &str); 2] {
        [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ]
    }
}
