// ABOUTME: Core types and constants for the Strava connector
// ABOUTME: Foundation crate with error handling, token and webhook models, and call contexts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Strava Core
//!
//! Foundation crate providing the shared types of the Strava connector. It has no
//! networking of its own so the client, rate limiter, and webhook crates can all
//! depend on it without pulling in a runtime.
//!
//! ## Modules
//!
//! - **errors**: `ConnectorError` taxonomy and the `ConnectorResult` alias
//! - **constants**: provider URLs, quota windows, pagination bounds, webhook defaults
//! - **context**: `CallContext`, the per-call deadline carried through every operation
//! - **models**: OAuth token, webhook events, subscription challenge, stream keys

/// Unified error taxonomy for provider calls and the webhook handshake
pub mod errors;

/// Provider constants organized by domain
pub mod constants;

/// Per-call deadline propagation
pub mod context;

/// Token, event, subscription, and stream models
pub mod models;

pub use context::CallContext;
pub use errors::{ConnectorError, ConnectorResult};
pub use models::{
    AspectType, InboundEvent, ObjectType, StreamType, SubscriptionChallenge, SubscriptionCreated,
    Token,
};
