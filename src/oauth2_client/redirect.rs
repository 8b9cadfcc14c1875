// ABOUTME: Local listener that captures the authorization code from the OAuth redirect
// ABOUTME: Serves the redirect path until the provider sends either a code or an error
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use strava_core::{ConnectorError, ConnectorResult};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::server::{bind_address, route_path, spawn_server, ServerHandle};

/// Code on approval, provider error string on denial
type RedirectOutcome = Result<String, String>;

#[derive(Debug, Deserialize)]
struct RedirectParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn handle_redirect(
    State(sender): State<mpsc::Sender<RedirectOutcome>>,
    Query(params): Query<RedirectParams>,
) -> (StatusCode, &'static str) {
    let code = params.code.filter(|c| !c.is_empty());
    let error = params.error.filter(|e| !e.is_empty());

    match (code, error) {
        (Some(code), _) => {
            debug!("authorization code received");
            // Only the first redirect matters; later ones find the slot full
            let _ = sender.try_send(Ok(code));
            (
                StatusCode::OK,
                "Authorization complete. You can close this window.",
            )
        }
        (None, Some(error)) => {
            warn!(error = %error, "authorization redirect carried an error");
            let _ = sender.try_send(Err(error));
            (StatusCode::OK, "Authorization was not granted.")
        }
        (None, None) => (StatusCode::BAD_REQUEST, "missing code"),
    }
}

/// Listener waiting for a single authorization redirect
#[derive(Debug)]
pub struct RedirectListener {
    server: ServerHandle,
    receiver: mpsc::Receiver<RedirectOutcome>,
}

impl RedirectListener {
    /// Start listening on the host, port, and path of `redirect_url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable URL, or a server error if
    /// the listener cannot be bound
    pub async fn start(redirect_url: &str) -> ConnectorResult<Self> {
        let bind = bind_address(redirect_url)?;
        let path = route_path(redirect_url)?;
        let (sender, receiver) = mpsc::channel(1);

        let router = Router::new()
            .route(&path, get(handle_redirect))
            .with_state(sender);
        let server = spawn_server(&bind, router).await?;
        info!(address = %server.local_addr(), path = %path, "waiting for authorization redirect");

        Ok(Self { server, receiver })
    }

    /// Address the listener is bound to
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Wait for the redirect, then stop the listener
    ///
    /// `None` waits without limit.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationDenied` when the provider reports an error or no
    /// redirect arrives within `limit`
    pub async fn wait(mut self, limit: Option<Duration>) -> ConnectorResult<String> {
        let received = match limit {
            Some(limit) => timeout(limit, self.receiver.recv()).await.ok(),
            None => Some(self.receiver.recv().await),
        };

        if let Err(e) = self.server.shutdown().await {
            warn!(error = %e, "redirect listener did not stop cleanly");
        }

        match received {
            Some(Some(Ok(code))) => Ok(code),
            Some(Some(Err(error))) => Err(ConnectorError::AuthorizationDenied { reason: error }),
            Some(None) => Err(ConnectorError::server("redirect listener stopped unexpectedly")),
            None => Err(ConnectorError::AuthorizationDenied {
                reason: "no authorization received before the timeout".to_owned(),
            }),
        }
    }
}

/// Listen on `redirect_url` until the provider redirects back with a code
///
/// # Errors
///
/// See [`RedirectListener::start`] and [`RedirectListener::wait`]
pub async fn await_authorization_code(
    redirect_url: &str,
    limit: Option<Duration>,
) -> ConnectorResult<String> {
    RedirectListener::start(redirect_url).await?.wait(limit).await
}
