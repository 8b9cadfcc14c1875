// ABOUTME: Local HTTP listener lifecycle shared by the webhook and OAuth redirect servers
// ABOUTME: Binds first, signals readiness from the serving task, and shuts down gracefully
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::io;
use std::net::SocketAddr;

use axum::Router;
use strava_core::{ConnectorError, ConnectorResult};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

/// A running local server
///
/// Dropping the handle without calling [`ServerHandle::shutdown`] also stops
/// the server, since the shutdown channel closes.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests
    ///
    /// # Errors
    ///
    /// Returns a server error if the serving task failed or panicked
    pub async fn shutdown(self) -> ConnectorResult<()> {
        // The task may already be gone; its result is reported below
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(Ok(())) => {
                info!(address = %self.local_addr, "server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ConnectorError::server(format!(
                "server on {} failed: {e}",
                self.local_addr
            ))),
            Err(e) => Err(ConnectorError::server(format!(
                "server task on {} did not complete: {e}",
                self.local_addr
            ))),
        }
    }
}

/// Bind `bind_addr` and serve `router` on a background task
///
/// Returns once the serving task is running. The listener is bound before the
/// task starts, so connections made after this returns are accepted.
///
/// # Errors
///
/// Returns a server error if the address cannot be bound or the serving task
/// exits before signalling readiness
pub async fn spawn_server(bind_addr: &str, router: Router) -> ConnectorResult<ServerHandle> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| ConnectorError::server(format!("failed to bind {bind_addr}: {e}")))?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let (ready_tx, ready_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let _ = ready_tx.send(());
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = &result {
            error!(address = %local_addr, error = %e, "server failed");
        }
        result
    });

    ready_rx
        .await
        .map_err(|_| ConnectorError::server("server task exited before it was ready"))?;

    info!(address = %local_addr, "server listening");
    Ok(ServerHandle {
        local_addr,
        shutdown: shutdown_tx,
        task,
    })
}

/// `host:port` to bind for a URL such as `http://localhost:8086`
///
/// # Errors
///
/// Returns a configuration error if the URL cannot be parsed or has no host
pub fn bind_address(url: &str) -> ConnectorResult<String> {
    let parsed = parse_url(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ConnectorError::config(format!("{url} has no host")))?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| ConnectorError::config(format!("{url} has no port")))?;
    Ok(format!("{host}:{port}"))
}

/// Route path of a URL, always starting with `/`
///
/// # Errors
///
/// Returns a configuration error if the URL cannot be parsed
pub fn route_path(url: &str) -> ConnectorResult<String> {
    Ok(parse_url(url)?.path().to_owned())
}

fn parse_url(url: &str) -> ConnectorResult<Url> {
    Url::parse(url).map_err(|e| ConnectorError::config(format!("invalid URL {url}: {e}")))
}
