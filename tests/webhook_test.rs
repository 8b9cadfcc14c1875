// ABOUTME: Tests for the webhook callback routes and the subscription coordinator
// ABOUTME: Runs the real callback server against a fake provider that performs the verification GET
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use strava_connector::server::{spawn_server, ServerHandle};
use strava_connector::webhook::{webhook_router, ChallengeSlot, WebhookState};
use strava_connector::{
    handler_fn, CallContext, ConnectorError, EventHandler, InboundEvent, ObjectType,
    SubscriptionState, WebhookConfig, WebhookCoordinator,
};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBSCRIPTION_ID: i64 = 120_475;

fn event_json() -> Value {
    json!({
        "aspect_type": "update",
        "event_time": 1_516_126_040,
        "object_id": 1_360_128_428,
        "object_type": "activity",
        "owner_id": 134_815,
        "subscription_id": SUBSCRIPTION_ID,
        "updates": { "title": "Messy" }
    })
}

fn forwarding_handler() -> (Arc<dyn EventHandler>, mpsc::Receiver<InboundEvent>) {
    let (tx, rx) = mpsc::channel(8);
    let handler = handler_fn(move |event| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(event).await;
        }
    });
    (handler, rx)
}

fn test_router(handler: Option<Arc<dyn EventHandler>>) -> (Router, Arc<ChallengeSlot>) {
    let slot = Arc::new(ChallengeSlot::new());
    let state = WebhookState::new("STRAVA", Arc::clone(&slot), handler);
    (webhook_router("/webhook", state), slot)
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_verification_echoes_challenge() {
    let (router, slot) = test_router(None);
    let receiver = slot.arm().unwrap();

    let request = Request::builder()
        .uri("/webhook?hub.verify_token=STRAVA&hub.challenge=15f7d1a91c1f40f8a748fd134752feb3&hub.mode=subscribe")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        body,
        json!({ "hub.challenge": "15f7d1a91c1f40f8a748fd134752feb3" })
    );

    let challenge = receiver.await.unwrap();
    assert_eq!(challenge.hub_challenge, "15f7d1a91c1f40f8a748fd134752feb3");
    assert_eq!(challenge.mode.as_deref(), Some("subscribe"));
}

#[tokio::test]
async fn test_verification_rejects_wrong_token() {
    let (router, slot) = test_router(None);
    let _receiver = slot.arm().unwrap();

    let request = Request::builder()
        .uri("/webhook?hub.verify_token=WRONG&hub.challenge=abc&hub.mode=subscribe")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_string(response).await,
        "verification tokens do not match"
    );
    assert!(slot.is_armed());
}

#[tokio::test]
async fn test_verification_without_challenge_is_bad_request() {
    let (router, slot) = test_router(None);
    let _receiver = slot.arm().unwrap();

    for uri in [
        "/webhook?hub.verify_token=STRAVA&hub.mode=subscribe",
        "/webhook?hub.verify_token=STRAVA&hub.challenge=&hub.mode=subscribe",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_string(response).await, "missing hub.challenge");
    }

    // Nothing reached the pending attempt
    assert!(slot.is_armed());
}

#[tokio::test]
async fn test_event_is_acknowledged_and_dispatched() {
    let (handler, mut events) = forwarding_handler();
    let (router, _) = test_router(Some(handler));

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(event_json().to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.object_type, ObjectType::Activity);
    assert_eq!(event.object_id, 1_360_128_428);
    assert_eq!(event.updates.get("title").map(String::as_str), Some("Messy"));
}

#[tokio::test]
async fn test_malformed_event_is_rejected() {
    let (router, _) = test_router(None);

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .body(Body::from("{\"object_type\":"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response)
        .await
        .starts_with("error unmarshalling event"));
}

#[tokio::test]
async fn test_status_reports_alive() {
    let (router, _) = test_router(None);
    let request = Request::builder()
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "alive");
}

// Fake provider ---------------------------------------------------------

#[derive(Clone)]
struct FakeProvider {
    http: Client,
    verify_token: Option<&'static str>,
}

async fn fake_create_subscription(
    State(provider): State<FakeProvider>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let callback_url = payload["callback_url"].as_str().unwrap_or_default();
    let configured: Option<&str> = provider.verify_token;
    let verify_token = configured
        .or_else(|| payload["verify_token"].as_str())
        .unwrap_or_default();

    let verified = match provider
        .http
        .get(callback_url)
        .query(&[
            ("hub.mode", "subscribe"),
            ("hub.challenge", "f5a2"),
            ("hub.verify_token", verify_token),
        ])
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response
            .json::<Value>()
            .await
            .is_ok_and(|body| body["hub.challenge"] == "f5a2"),
        _ => false,
    };

    if verified {
        (
            StatusCode::CREATED,
            Json(json!({ "id": SUBSCRIPTION_ID })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Bad Request",
                "errors": [{
                    "resource": "PushSubscription",
                    "field": "callback url",
                    "code": "GET to callback URL does not return 200"
                }]
            })),
        )
    }
}

async fn start_fake_provider(verify_token: Option<&'static str>) -> ServerHandle {
    let provider = FakeProvider {
        http: Client::new(),
        verify_token,
    };
    let router = Router::new()
        .route("/api/v3/push_subscriptions", post(fake_create_subscription))
        .with_state(provider);
    spawn_server("127.0.0.1:0", router).await.unwrap()
}

fn free_port() -> u16 {
    StdTcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn coordinator_config(provider: &ServerHandle) -> (WebhookConfig, String) {
    let port = free_port();
    let mut config = WebhookConfig::new(
        "12345",
        "shh",
        format!("http://127.0.0.1:{port}/webhook"),
    );
    config.server_url = format!("http://127.0.0.1:{port}");
    config.api_base_url = format!("http://{}/api/v3", provider.local_addr());
    config.handshake_timeout = Duration::from_secs(5);
    (config, format!("http://127.0.0.1:{port}"))
}

#[tokio::test]
async fn test_create_subscription_completes_handshake() {
    let provider = start_fake_provider(None).await;
    let (config, local) = coordinator_config(&provider);
    let (handler, mut events) = forwarding_handler();
    let coordinator = WebhookCoordinator::new(config).with_handler(handler);
    assert_eq!(coordinator.state(), SubscriptionState::Idle);

    let (id, server) = coordinator
        .create_subscription(&CallContext::background())
        .await
        .unwrap();
    assert_eq!(id, SUBSCRIPTION_ID);
    assert_eq!(
        coordinator.state(),
        SubscriptionState::SubscriptionConfirmed { id }
    );

    // The server keeps running and dispatches pushed events
    let http = Client::new();
    let status = http
        .get(format!("{local}/status"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(status, "alive");

    let response = http
        .post(format!("{local}/webhook"))
        .json(&event_json())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.subscription_id, SUBSCRIPTION_ID);

    server.shutdown().await.unwrap();
    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_wrong_verify_token_fails_at_deadline() {
    let provider = start_fake_provider(Some("NOT-STRAVA")).await;
    let (config, local) = coordinator_config(&provider);
    let coordinator = WebhookCoordinator::new(config);

    let ctx = CallContext::with_timeout(Duration::from_millis(500));
    let err = coordinator.create_subscription(&ctx).await.unwrap_err();

    assert!(
        matches!(err, ConnectorError::SubscriptionHandshakeFailed { .. }),
        "unexpected error: {err:?}"
    );
    assert!(matches!(
        coordinator.state(),
        SubscriptionState::Failed { .. }
    ));

    // The callback server is shut down after a failed attempt
    let probe = Client::new().get(format!("{local}/status")).send().await;
    assert!(probe.is_err());

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_state_stays_awaiting_challenge_until_deadline() {
    let provider = start_fake_provider(Some("NOT-STRAVA")).await;
    let (config, _) = coordinator_config(&provider);
    let coordinator = WebhookCoordinator::new(config);
    let mut states = coordinator.subscribe_state();

    let start = Instant::now();
    let ctx = CallContext::with_timeout(Duration::from_secs(1));
    let observe = async {
        states
            .wait_for(|state| *state == SubscriptionState::AwaitingChallenge)
            .await
            .unwrap();
        // The provider has answered by now but the deadline is still ahead
        sleep(Duration::from_millis(400)).await;
        let midway = states.borrow().clone();
        states
            .wait_for(|state| matches!(state, SubscriptionState::Failed { .. }))
            .await
            .unwrap();
        (midway, start.elapsed())
    };

    let (result, (midway, failed_after)) =
        tokio::join!(coordinator.create_subscription(&ctx), observe);

    assert!(result.is_err());
    assert_eq!(midway, SubscriptionState::AwaitingChallenge);
    assert!(
        failed_after >= Duration::from_millis(950),
        "failed after {failed_after:?}"
    );
    match coordinator.state() {
        SubscriptionState::Failed { reason } => {
            assert!(reason.contains("400"), "reason: {reason}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rejected_creation_reports_provider_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/push_subscriptions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Authorization Error",
            "errors": [{ "resource": "Application", "field": "client_id", "code": "invalid" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let port = free_port();
    let mut config = WebhookConfig::new(
        "12345",
        "bad-secret",
        format!("http://127.0.0.1:{port}/webhook"),
    );
    config.server_url = format!("http://127.0.0.1:{port}");
    config.api_base_url = format!("{}/api/v3", server.uri());
    let coordinator = WebhookCoordinator::new(config);

    let ctx = CallContext::with_timeout(Duration::from_millis(300));
    let err = coordinator.create_subscription(&ctx).await.unwrap_err();

    match err {
        ConnectorError::SubscriptionHandshakeFailed { reason } => {
            assert!(reason.contains("401"), "reason: {reason}");
            assert!(reason.contains("Authorization Error"), "reason: {reason}");
        }
        other => panic!("expected SubscriptionHandshakeFailed, got {other:?}"),
    }
    assert!(matches!(
        coordinator.state(),
        SubscriptionState::Failed { .. }
    ));
}

#[tokio::test]
async fn test_concurrent_create_is_rejected() {
    let provider = start_fake_provider(None).await;
    let (config, _) = coordinator_config(&provider);
    let coordinator = WebhookCoordinator::new(config);
    let ctx = CallContext::background();

    let (first, second) = tokio::join!(
        coordinator.create_subscription(&ctx),
        coordinator.create_subscription(&ctx)
    );

    let (id, server) = first.unwrap();
    assert_eq!(id, SUBSCRIPTION_ID);
    assert!(matches!(
        second,
        Err(ConnectorError::SubscriptionHandshakeFailed { .. })
    ));

    server.shutdown().await.unwrap();
    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_status_path_cannot_be_the_callback() {
    let coordinator = WebhookCoordinator::new(WebhookConfig::new(
        "12345",
        "shh",
        "https://hooks.example.com/status",
    ));
    assert!(matches!(coordinator.router(), Err(ConnectorError::Config(_))));
}

// Subscription management -----------------------------------------------

fn managed_coordinator(server: &MockServer) -> WebhookCoordinator {
    let mut config = WebhookConfig::new("12345", "shh", "https://hooks.example.com/webhook");
    config.api_base_url = format!("{}/api/v3", server.uri());
    WebhookCoordinator::new(config)
}

#[tokio::test]
async fn test_view_subscription_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/push_subscriptions"))
        .and(query_param("client_id", "12345"))
        .and(query_param("client_secret", "shh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": SUBSCRIPTION_ID,
            "application_id": 12345,
            "callback_url": "https://hooks.example.com/webhook"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let body = managed_coordinator(&server)
        .view_subscription(&CallContext::background())
        .await
        .unwrap();
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed[0]["id"], SUBSCRIPTION_ID);
}

#[tokio::test]
async fn test_delete_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/v3/push_subscriptions/{SUBSCRIPTION_ID}")))
        .and(query_param("client_id", "12345"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/push_subscriptions/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let coordinator = managed_coordinator(&server);
    let ctx = CallContext::background();

    let body = coordinator
        .delete_subscription(&ctx, SUBSCRIPTION_ID)
        .await
        .unwrap();
    assert!(body.is_empty());

    let err = coordinator.delete_subscription(&ctx, 1).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err:?}");
}
