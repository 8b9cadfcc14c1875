// ABOUTME: Webhook module: callback server, subscription handshake, and event dispatch
// ABOUTME: Re-exports the coordinator, routes, and handler types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Webhooks
//!
//! The provider pushes activity and athlete changes to a public callback URL.
//! Creating the subscription is a handshake: the creation POST only succeeds
//! after the provider has sent a verification GET to the callback and received
//! the challenge back. [`WebhookCoordinator`] runs the local server that
//! answers that GET and hands the challenge to the pending creation call.

/// Subscription lifecycle and state machine
pub mod coordinator;
/// Event handler trait
pub mod handler;
/// Challenge handoff between the callback handler and the creator
pub mod rendezvous;
/// Axum routes for the callback server
pub mod routes;

pub use coordinator::{SubscriptionState, WebhookConfig, WebhookCoordinator};
pub use handler::{handler_fn, EventHandler, FnHandler};
pub use rendezvous::ChallengeSlot;
pub use routes::{webhook_router, WebhookState};
