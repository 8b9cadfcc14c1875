// ABOUTME: Main library entry point for the Strava connector
// ABOUTME: OAuth2 token lifecycle, rate-limited data access, and webhook subscriptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Strava Connector
//!
//! A client for the Strava v3 API that owns the parts of the integration
//! that are easy to get wrong:
//!
//! - **Tokens**: the [`TokenAgent`] exchanges the authorization code once and
//!   refreshes the token before every API call
//! - **Quota**: the [`RateLimiter`] admits calls against both the 15 minute
//!   and the daily read windows, waiting cooperatively within the caller's
//!   deadline
//! - **Data**: [`StravaApi`] fetches the athlete, activity pages, single
//!   activities, and activity streams as raw JSON
//! - **Webhooks**: the [`WebhookCoordinator`] runs the callback server,
//!   completes the subscription handshake, and dispatches pushed events to an
//!   [`EventHandler`]
//!
//! Every operation takes a [`CallContext`] carrying an optional deadline.
//! Nothing retries on its own; failures are classified by [`ConnectorError`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strava_connector::config::ConnectorConfig;
//! use strava_connector::{read_token_file, CallContext, OAuth2Client, StravaApi, TokenAgent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConnectorConfig::load(None)?;
//!     config.validate()?;
//!
//!     let token = read_token_file("token.json").await?;
//!     let agent = TokenAgent::new(OAuth2Client::new(config.oauth_config()?), token);
//!     let api = StravaApi::new(Arc::new(agent));
//!
//!     let athlete = api.get_athlete(&CallContext::background()).await?;
//!     println!("{athlete}");
//!     Ok(())
//! }
//! ```

/// Provider data endpoints and pagination
pub mod api;

/// Configuration loading from file and environment
pub mod config;

/// Structured logging setup
pub mod logging;

/// OAuth2 client, token agent, redirect listener, and token files
pub mod oauth2_client;

/// Dual-window request admission
pub mod rate_limiting;

/// Local HTTP listener lifecycle
pub mod server;

/// Shared HTTP helpers
pub mod utils;

/// Webhook callback server and subscription management
pub mod webhook;

pub use api::StravaApi;
pub use oauth2_client::{
    read_token_file, write_token_file, OAuth2Client, OAuth2Config, StaticToken, TokenAgent,
    TokenSource,
};
pub use rate_limiting::{RateLimiter, WindowConfig};
pub use server::ServerHandle;
pub use strava_core;
pub use strava_core::{
    AspectType, CallContext, ConnectorError, ConnectorResult, InboundEvent, ObjectType,
    StreamType, Token,
};
pub use webhook::{
    handler_fn, EventHandler, SubscriptionState, WebhookConfig, WebhookCoordinator,
};
