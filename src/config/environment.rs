// ABOUTME: Environment variable overrides for the connector configuration
// ABOUTME: Every STRAVA_* variable, when set and non-empty, replaces the file or default value
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::env;
use std::path::PathBuf;

use strava_core::{ConnectorError, ConnectorResult};
use tracing::debug;

use super::ConnectorConfig;

/// Application client id
pub const CLIENT_ID: &str = "STRAVA_CLIENT_ID";
/// Application client secret
pub const CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
/// Full OAuth redirect URL
pub const REDIRECT_URL: &str = "STRAVA_REDIRECT_URL";
/// Public domain the provider calls back on
pub const CALLBACK_DOMAIN: &str = "STRAVA_CALLBACK_DOMAIN";
/// Local webhook server URL
pub const WEBHOOK_SERVER_URL: &str = "STRAVA_WEBHOOK_SERVER_URL";
/// Webhook verification token
pub const WEBHOOK_VERIFY_TOKEN: &str = "STRAVA_WEBHOOK_VERIFY_TOKEN";
/// Comma-separated scopes
pub const SCOPES: &str = "STRAVA_SCOPES";
/// Token file path
pub const TOKEN_PATH: &str = "STRAVA_TOKEN_PATH";
/// API base URL
pub const API_BASE: &str = "STRAVA_API_BASE";
/// OAuth base URL
pub const OAUTH_BASE: &str = "STRAVA_OAUTH_BASE";
/// Handshake timeout in seconds
pub const HANDSHAKE_TIMEOUT: &str = "STRAVA_HANDSHAKE_TIMEOUT_SECS";

/// Non-empty value of an environment variable
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn override_string(target: &mut String, key: &str) {
    if let Some(value) = env_value(key) {
        debug!(variable = key, "configuration overridden from environment");
        *target = value;
    }
}

/// Parse comma-separated scopes
pub fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Apply every set `STRAVA_*` variable on top of `config`
///
/// # Errors
///
/// Returns a configuration error if a numeric variable does not parse
pub fn apply_env_overrides(config: &mut ConnectorConfig) -> ConnectorResult<()> {
    override_string(&mut config.client_id, CLIENT_ID);
    override_string(&mut config.client_secret, CLIENT_SECRET);
    override_string(
        &mut config.authorization_callback_domain,
        CALLBACK_DOMAIN,
    );
    override_string(&mut config.webhook_server_url, WEBHOOK_SERVER_URL);
    override_string(&mut config.webhook_verify_token, WEBHOOK_VERIFY_TOKEN);
    override_string(&mut config.api_base_url, API_BASE);
    override_string(&mut config.oauth_base_url, OAUTH_BASE);

    if let Some(redirect_url) = env_value(REDIRECT_URL) {
        config.redirect_url = Some(redirect_url);
    }
    if let Some(scopes) = env_value(SCOPES) {
        config.scopes = parse_scopes(&scopes);
    }
    if let Some(path) = env_value(TOKEN_PATH) {
        config.token_path = Some(PathBuf::from(path));
    }
    if let Some(secs) = env_value(HANDSHAKE_TIMEOUT) {
        config.handshake_timeout_secs = secs.trim().parse().map_err(|_| {
            ConnectorError::config(format!("invalid {HANDSHAKE_TIMEOUT} value: {secs}"))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes() {
        assert_eq!(
            parse_scopes("activity:read_all, profile:read_all,,"),
            vec!["activity:read_all".to_owned(), "profile:read_all".to_owned()]
        );
        assert!(parse_scopes("").is_empty());
    }
}
