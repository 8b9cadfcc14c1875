// ABOUTME: Tests for configuration loading from JSON files and STRAVA_* environment variables
// ABOUTME: Serialized because environment variables are process-wide
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serial_test::serial;
use strava_connector::config::environment::{
    API_BASE, CALLBACK_DOMAIN, CLIENT_ID, CLIENT_SECRET, HANDSHAKE_TIMEOUT, OAUTH_BASE,
    REDIRECT_URL, SCOPES, TOKEN_PATH, WEBHOOK_SERVER_URL, WEBHOOK_VERIFY_TOKEN,
};
use strava_connector::config::ConnectorConfig;
use strava_connector::ConnectorError;
use tempfile::TempDir;

const ALL_VARS: [&str; 11] = [
    CLIENT_ID,
    CLIENT_SECRET,
    REDIRECT_URL,
    CALLBACK_DOMAIN,
    WEBHOOK_SERVER_URL,
    WEBHOOK_VERIFY_TOKEN,
    SCOPES,
    TOKEN_PATH,
    API_BASE,
    OAUTH_BASE,
    HANDSHAKE_TIMEOUT,
];

fn clear_env() {
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("connector.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_file_values_with_blanks_keep_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "client_id": "12345",
            "client_secret": "shh",
            "authorization_callback_domain": "https://hooks.example.com",
            "webhook_path": "",
            "scopes": [],
            "redirect_url": "  "
        }"#,
    );

    let config = ConnectorConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.client_id, "12345");
    assert_eq!(config.webhook_path, "/webhook");
    assert_eq!(config.scopes, vec!["activity:read_all".to_owned()]);
    assert_eq!(config.redirect_url, None);
    assert_eq!(
        config.redirect_url().unwrap(),
        "https://hooks.example.com/strava/callback"
    );
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{ "client_id": "from-file", "client_secret": "file-secret" }"#,
    );

    env::set_var(CLIENT_ID, "from-env");
    env::set_var(CLIENT_SECRET, "");
    env::set_var(SCOPES, "activity:read_all, profile:read_all");
    env::set_var(TOKEN_PATH, "/tmp/strava-token.json");
    env::set_var(HANDSHAKE_TIMEOUT, "12");

    let config = ConnectorConfig::load(Some(path.as_path())).unwrap();
    clear_env();

    assert_eq!(config.client_id, "from-env");
    // Empty variables are ignored
    assert_eq!(config.client_secret, "file-secret");
    assert_eq!(
        config.scopes,
        vec!["activity:read_all".to_owned(), "profile:read_all".to_owned()]
    );
    assert_eq!(
        config.token_path,
        Some(PathBuf::from("/tmp/strava-token.json"))
    );
    assert_eq!(config.handshake_timeout(), Duration::from_secs(12));
}

#[test]
#[serial]
fn test_malformed_timeout_is_config_error() {
    clear_env();
    env::set_var(HANDSHAKE_TIMEOUT, "soon");
    let result = ConnectorConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(ConnectorError::Config(_))));
}

#[test]
#[serial]
fn test_missing_explicit_file_is_io_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let result = ConnectorConfig::load(Some(dir.path().join("absent.json").as_path()));
    assert!(matches!(result, Err(ConnectorError::Io(_))));
}

#[test]
#[serial]
fn test_webhook_config_uses_callback_domain() {
    clear_env();
    env::set_var(CLIENT_ID, "12345");
    env::set_var(CLIENT_SECRET, "shh");
    env::set_var(CALLBACK_DOMAIN, "https://hooks.example.com/");
    env::set_var(WEBHOOK_SERVER_URL, "http://0.0.0.0:9000");
    env::set_var(WEBHOOK_VERIFY_TOKEN, "s3cret");
    let config = ConnectorConfig::from_env().unwrap();
    clear_env();

    let webhook = config.webhook_config().unwrap();
    assert_eq!(webhook.callback_url, "https://hooks.example.com/webhook");
    assert_eq!(webhook.server_url, "http://0.0.0.0:9000");
    assert_eq!(webhook.verify_token, "s3cret");
    assert_eq!(webhook.client_id, "12345");

    let oauth = config.oauth_config().unwrap();
    assert_eq!(oauth.token_url, "https://www.strava.com/oauth/token");
    assert_eq!(
        oauth.redirect_uri,
        "https://hooks.example.com/strava/callback"
    );
}

#[test]
#[serial]
fn test_missing_credentials_fail_validation() {
    clear_env();
    let config = ConnectorConfig::from_env().unwrap();
    assert!(matches!(config.validate(), Err(ConnectorError::Config(_))));
    assert!(config.webhook_config().is_err());
}
