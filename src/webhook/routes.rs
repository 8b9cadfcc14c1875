// ABOUTME: Axum routes for the webhook callback: verification challenge, event delivery, liveness
// ABOUTME: Answers the provider immediately and runs event handlers on spawned tasks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use strava_core::constants::webhook::{ALIVE_BODY, STATUS_PATH};
use strava_core::{InboundEvent, SubscriptionChallenge};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::handler::EventHandler;
use super::rendezvous::ChallengeSlot;

/// Shared state behind the webhook routes
#[derive(Clone)]
pub struct WebhookState {
    verify_token: Arc<str>,
    challenges: Arc<ChallengeSlot>,
    handler: Option<Arc<dyn EventHandler>>,
}

impl WebhookState {
    /// State checking challenges against `verify_token`
    #[must_use]
    pub fn new(
        verify_token: &str,
        challenges: Arc<ChallengeSlot>,
        handler: Option<Arc<dyn EventHandler>>,
    ) -> Self {
        Self {
            verify_token: Arc::from(verify_token),
            challenges,
            handler,
        }
    }
}

/// Verification query; every field is optional so a missing token is
/// answered like a wrong one
#[derive(Debug, Deserialize)]
struct ChallengeParams {
    #[serde(rename = "hub.challenge", default)]
    challenge: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    verify_token: Option<String>,
    #[serde(rename = "hub.mode", default)]
    mode: Option<String>,
}

/// Build the webhook router
///
/// `callback_path` serves both the verification GET and the event POST;
/// `/status` answers `alive`.
pub fn webhook_router(callback_path: &str, state: WebhookState) -> Router {
    Router::new()
        .route(callback_path, get(verify_subscription).post(receive_event))
        .route(STATUS_PATH, get(status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn status() -> &'static str {
    ALIVE_BODY
}

async fn verify_subscription(
    State(state): State<WebhookState>,
    Query(params): Query<ChallengeParams>,
) -> Response {
    let verify_token = params.verify_token.unwrap_or_default();
    if verify_token != *state.verify_token {
        warn!("verification tokens do not match");
        return (
            StatusCode::UNAUTHORIZED,
            "verification tokens do not match",
        )
            .into_response();
    }

    let Some(hub_challenge) = params.challenge.filter(|challenge| !challenge.is_empty()) else {
        warn!("verification request carried no challenge");
        return (StatusCode::BAD_REQUEST, "missing hub.challenge").into_response();
    };
    let body = Json(json!({ "hub.challenge": hub_challenge }));

    let challenge = SubscriptionChallenge {
        hub_challenge,
        verify_token,
        mode: params.mode,
    };
    if state.challenges.deliver(challenge) {
        info!("challenge handed to pending subscription attempt");
    } else {
        debug!("challenge answered with no subscription attempt pending");
    }

    (StatusCode::OK, body).into_response()
}

async fn receive_event(State(state): State<WebhookState>, body: Bytes) -> Response {
    let event: InboundEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "unable to deserialize webhook event");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error unmarshalling event: {e}"),
            )
                .into_response();
        }
    };

    debug!(
        object_type = %event.object_type,
        object_id = event.object_id,
        aspect_type = %event.aspect_type,
        "webhook event received"
    );

    match state.handler {
        Some(handler) => {
            tokio::spawn(async move {
                handler.handle(event).await;
            });
        }
        None => warn!("no webhook event handler defined, dropping event"),
    }

    StatusCode::OK.into_response()
}
