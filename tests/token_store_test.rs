// ABOUTME: Tests for reading and writing JSON token files
// ABOUTME: Uses temporary directories so nothing touches the user's token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use strava_connector::{read_token_file, write_token_file, ConnectorError, Token};
use tempfile::TempDir;
use tokio::fs;

fn sample_token() -> Token {
    Token {
        access_token: "a9b723".to_owned(),
        token_type: "Bearer".to_owned(),
        refresh_token: "b5c569".to_owned(),
        expiry: Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 12).single().unwrap(),
    }
}

#[tokio::test]
async fn test_write_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("strava").join("token.json");

    write_token_file(&path, &sample_token()).await.unwrap();
    let loaded = read_token_file(&path).await.unwrap();
    assert_eq!(loaded, sample_token());
}

#[tokio::test]
async fn test_file_uses_oauth2_token_field_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    write_token_file(&path, &sample_token()).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(raw["access_token"], "a9b723");
    assert_eq!(raw["token_type"], "Bearer");
    assert_eq!(raw["refresh_token"], "b5c569");
    assert_eq!(raw["expiry"], "2024-05-17T09:30:12Z");
}

#[tokio::test]
async fn test_read_errors_are_classified() {
    let dir = TempDir::new().unwrap();

    let missing = read_token_file(dir.path().join("absent.json")).await;
    assert!(matches!(missing, Err(ConnectorError::Io(_))));

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "not a token").await.unwrap();
    let invalid = read_token_file(&garbage).await;
    assert!(matches!(invalid, Err(ConnectorError::Serialization(_))));
}
