// ABOUTME: User-supplied handler invoked for every delivered webhook event
// ABOUTME: Async trait plus a closure adapter so plain async functions can be registered
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use strava_core::InboundEvent;

/// Processes events pushed by the provider
///
/// Each event is handled on its own spawned task after the provider has
/// already received its 200, so handlers may take as long as they need.
/// Nothing is retried and failures stay inside the handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event
    async fn handle(&self, event: InboundEvent);
}

/// Adapter turning an async closure into an [`EventHandler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(InboundEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, event: InboundEvent) {
        (self.0)(event).await;
    }
}

/// Wrap an async closure as a shareable event handler
///
/// ```ignore
/// let handler = handler_fn(|event| async move {
///     tracing::info!(object_id = event.object_id, "event received");
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(InboundEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
