// ABOUTME: Token persistence helpers for JSON token files
// ABOUTME: Reads and writes tokens in the same layout older tooling produced
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::path::Path;

use strava_core::{ConnectorResult, Token};
use tokio::fs;
use tracing::debug;

/// Load a token from a JSON file
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or a serialization error
/// if it does not hold a token
pub async fn read_token_file(path: impl AsRef<Path>) -> ConnectorResult<Token> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading token file");
    let contents = fs::read_to_string(path).await?;
    Token::from_json_str(&contents)
}

/// Write a token to a JSON file, creating parent directories as needed
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written
pub async fn write_token_file(path: impl AsRef<Path>, token: &Token) -> ConnectorResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, token.to_json_pretty()?).await?;
    debug!(path = %path.display(), "token written");
    Ok(())
}
