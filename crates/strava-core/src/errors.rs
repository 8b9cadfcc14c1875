// ABOUTME: Error taxonomy for Strava API calls, token refresh, and webhook handshakes
// ABOUTME: Classifies failures precisely enough for callers to choose their own retry policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Connector Error Types
//!
//! Nothing in the connector retries on its own. Each variant names a failure
//! class so the caller can decide whether to back off, re-authorize, or give up:
//!
//! - `NotFound` - provider answered 404, usually "no data"
//! - `RateLimitExceeded` - admission did not fit inside the caller's deadline
//! - `TokenRefreshFailed` - token exchange or refresh failed for this call
//! - `InvalidStreamType` - client-side validation, no quota consumed
//! - `RequestFailed` - transport error or non-404 HTTP failure
//! - `SubscriptionHandshakeFailed` - webhook subscription attempt failed

use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Boxed error used to keep the underlying cause of a failure
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used across the connector
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors surfaced by the connector
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The provider returned HTTP 404 for the requested resource
    #[error("{resource} not found")]
    NotFound {
        /// Human readable name of the missing resource
        resource: String,
    },

    /// The rate limiter could not admit the call before the deadline
    #[error("rate limit exceeded: the {window} window needs {wait:?} before the next request")]
    RateLimitExceeded {
        /// Window that blocked admission
        window: &'static str,
        /// Wait that would have been required
        wait: Duration,
    },

    /// Exchanging or refreshing the OAuth token failed
    #[error("token refresh failed: {reason}")]
    TokenRefreshFailed {
        /// Why the token endpoint call failed
        reason: String,
        /// Underlying cause, if any
        #[source]
        source: Option<BoxError>,
    },

    /// A stream key outside the provider's supported set was requested
    #[error("{key} is not a valid stream type")]
    InvalidStreamType {
        /// The rejected key
        key: String,
    },

    /// Transport failure or non-404 HTTP error
    #[error("request failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    RequestFailed {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Description of the failure
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<BoxError>,
    },

    /// The webhook subscription handshake did not complete
    #[error("subscription handshake failed: {reason}")]
    SubscriptionHandshakeFailed {
        /// Why the attempt failed
        reason: String,
    },

    /// The user declined the authorization request
    #[error("authorization denied: {reason}")]
    AuthorizationDenied {
        /// Error reported by the provider redirect
        reason: String,
    },

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A local listener could not be started or stopped cleanly
    #[error("server error: {0}")]
    Server(String),

    /// Local I/O failure (token files, listeners)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectorError {
    /// Create a "not found" error
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a "rate limit exceeded" error
    #[must_use]
    pub const fn rate_limit_exceeded(window: &'static str, wait: Duration) -> Self {
        Self::RateLimitExceeded { window, wait }
    }

    /// Create a token refresh error without an underlying cause
    #[must_use]
    pub fn token_refresh_failed(reason: impl Into<String>) -> Self {
        Self::TokenRefreshFailed {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a token refresh error wrapping its cause
    #[must_use]
    pub fn token_refresh_failed_with(
        reason: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::TokenRefreshFailed {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Create an "invalid stream type" error
    #[must_use]
    pub fn invalid_stream_type(key: impl Into<String>) -> Self {
        Self::InvalidStreamType { key: key.into() }
    }

    /// Create a request failure for a non-success HTTP status
    #[must_use]
    pub fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Create a handshake failure
    #[must_use]
    pub fn handshake_failed(reason: impl Into<String>) -> Self {
        Self::SubscriptionHandshakeFailed {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a local server error
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Whether this error means the provider has no such resource
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status attached to the failure, if one was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(feature = "http-errors")]
impl From<reqwest::Error> for ConnectorError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_owned()
        } else if error.is_decode() {
            "response body could not be decoded".to_owned()
        } else {
            error.to_string()
        };
        Self::RequestFailed {
            status: error.status().map(|s| s.as_u16()),
            message,
            source: Some(Box::new(error)),
        }
    }
}
