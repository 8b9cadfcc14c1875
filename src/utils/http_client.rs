// ABOUTME: Shared HTTP client utilities with timeout configuration and status classification
// ABOUTME: Maps provider responses onto connector errors so every caller treats 404 the same way
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use strava_core::constants::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use strava_core::{CallContext, ConnectorError, ConnectorResult};
use tracing::debug;

/// Create a new HTTP client with custom timeout settings
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a new HTTP client optimized for OAuth flows
///
/// Token exchanges should be fast, so the timeouts are shorter than for data calls.
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(15, 5) // 15s request timeout, 5s connect timeout
}

/// Create a new HTTP client for provider API calls
#[must_use]
pub fn api_client() -> Client {
    create_client_with_timeout(DEFAULT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS)
}

/// Bound a request by the time left on the caller's deadline
#[must_use]
pub fn apply_deadline(request: RequestBuilder, ctx: &CallContext) -> RequestBuilder {
    match ctx.remaining() {
        Some(remaining) => request.timeout(remaining),
        None => request,
    }
}

/// Classify a provider response
///
/// 404 becomes `NotFound` for `resource`; any other non-success status becomes
/// `RequestFailed` carrying the status and the response body.
///
/// # Errors
///
/// Returns `NotFound` or `RequestFailed` for non-success statuses
pub async fn ensure_success(response: Response, resource: &str) -> ConnectorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        debug!(resource, "provider returned 404");
        return Err(ConnectorError::not_found(resource));
    }

    let body = response.text().await.unwrap_or_default();
    Err(ConnectorError::request_failed(
        Some(status.as_u16()),
        format!("{resource}: {body}"),
    ))
}
