// ABOUTME: Tests for the OAuth2 client, token agent, and authorization redirect listener
// ABOUTME: Uses a fake token endpoint and real local listeners on ephemeral ports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use strava_connector::oauth2_client::RedirectListener;
use strava_connector::{
    CallContext, ConnectorError, OAuth2Client, OAuth2Config, Token, TokenAgent, TokenSource,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REDIRECT_URL: &str = "http://127.0.0.1:0/exchange_token";

fn oauth_client(server: &MockServer) -> OAuth2Client {
    OAuth2Client::new(OAuth2Config::with_oauth_base(
        &format!("{}/oauth", server.uri()),
        "12345",
        "shh",
        REDIRECT_URL,
        vec!["activity:read_all".to_owned()],
    ))
}

fn token(refresh_token: &str) -> Token {
    Token {
        access_token: "old".to_owned(),
        token_type: "Bearer".to_owned(),
        refresh_token: refresh_token.to_owned(),
        expiry: Utc::now(),
    }
}

#[tokio::test]
async fn test_exchange_authorization_code_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("client_id=12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "a9b723",
            "refresh_token": "b5c569",
            "expires_at": 1_568_775_134_i64,
            "expires_in": 21_600,
            "athlete": { "id": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = TokenAgent::unauthenticated(oauth_client(&server));
    assert!(agent.snapshot().await.is_none());

    let token = agent
        .exchange_authorization_code(&CallContext::background(), "abc123")
        .await
        .unwrap();
    assert_eq!(token.access_token, "a9b723");
    assert_eq!(token.refresh_token, "b5c569");
    assert_eq!(token.expiry.timestamp(), 1_568_775_134);
    assert_eq!(agent.snapshot().await, Some(token));
}

#[tokio::test]
async fn test_rejected_code_is_token_refresh_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Bad Request",
            "errors": [{ "resource": "AuthorizationCode", "code": "invalid" }]
        })))
        .mount(&server)
        .await;

    let agent = TokenAgent::unauthenticated(oauth_client(&server));
    let err = agent
        .exchange_authorization_code(&CallContext::background(), "expired")
        .await
        .unwrap_err();

    assert!(
        matches!(&err, ConnectorError::TokenRefreshFailed { reason, .. } if reason.contains("400")),
        "unexpected error: {err:?}"
    );
    assert!(agent.snapshot().await.is_none());
}

#[tokio::test]
async fn test_every_call_refreshes_and_replaces_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "new-access",
            "expires_in": 21_600
        })))
        .expect(2)
        .mount(&server)
        .await;

    let agent = TokenAgent::new(oauth_client(&server), token("keep-me"));
    let ctx = CallContext::background();

    let first = agent.current_token(&ctx).await.unwrap();
    let second = agent.current_token(&ctx).await.unwrap();

    assert_eq!(first.access_token, "new-access");
    assert_eq!(second.access_token, "new-access");
    // The endpoint omitted a refresh token, so the held one carries over
    assert_eq!(second.refresh_token, "keep-me");
    assert!(!second.is_expired());
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = CallContext::background();
    let agent = TokenAgent::new(oauth_client(&server), token(""));
    assert!(matches!(
        agent.current_token(&ctx).await,
        Err(ConnectorError::TokenRefreshFailed { .. })
    ));

    let agent = TokenAgent::unauthenticated(oauth_client(&server));
    assert!(matches!(
        agent.current_token(&ctx).await,
        Err(ConnectorError::TokenRefreshFailed { .. })
    ));
}

#[tokio::test]
async fn test_redirect_listener_captures_code() {
    let listener = RedirectListener::start(REDIRECT_URL).await.unwrap();
    let url = format!(
        "http://{}/exchange_token?state=&code=75e251e3ff8fff&scope=read,activity:read_all",
        listener.local_addr()
    );

    let browser = tokio::spawn(async move { Client::new().get(url).send().await });
    let code = listener.wait(Some(Duration::from_secs(5))).await.unwrap();
    assert_eq!(code, "75e251e3ff8fff");

    let response = browser.await.unwrap().unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_redirect_listener_reports_denial() {
    let listener = RedirectListener::start(REDIRECT_URL).await.unwrap();
    let url = format!(
        "http://{}/exchange_token?state=&error=access_denied",
        listener.local_addr()
    );

    let browser = tokio::spawn(async move { Client::new().get(url).send().await });
    let err = listener
        .wait(Some(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, ConnectorError::AuthorizationDenied { reason } if reason == "access_denied"),
        "unexpected error: {err:?}"
    );
    browser.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_redirect_listener_times_out() {
    let listener = RedirectListener::start(REDIRECT_URL).await.unwrap();
    let err = listener
        .wait(Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::AuthorizationDenied { .. }));
}
