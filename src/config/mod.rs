// ABOUTME: Connector configuration: application credentials, callback URLs, and endpoints
// ABOUTME: Loaded from an optional JSON file, then overridden from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Configuration module for the Strava connector
//!
//! Configuration is an explicit value handed to constructors; nothing reads
//! process-wide state after loading. Load order:
//!
//! 1. built-in defaults
//! 2. the JSON config file (`--config`, or `$HOME/.cassidy-connector-strava.json`
//!    when present)
//! 3. `STRAVA_*` environment variables

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strava_core::constants::oauth::{DEFAULT_REDIRECT_URL, DEFAULT_SCOPE};
use strava_core::constants::strava_urls::{API_BASE, OAUTH_BASE};
use strava_core::constants::webhook::{
    DEFAULT_CALLBACK_PATH, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_SERVER_URL,
    DEFAULT_VERIFY_TOKEN, DEFAULT_WEBHOOK_PATH,
};
use strava_core::{ConnectorError, ConnectorResult};
use tracing::{debug, info};
use url::Url;

use crate::oauth2_client::OAuth2Config;
use crate::webhook::WebhookConfig;

/// Environment variable overrides
pub mod environment;

pub use environment::{apply_env_overrides, parse_scopes};

/// File name of the default config in the home directory
pub const DEFAULT_CONFIG_FILE: &str = ".cassidy-connector-strava.json";

/// Everything needed to talk to the provider and run the webhook server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Application client id
    pub client_id: String,
    /// Application client secret
    pub client_secret: String,
    /// Public base URL the provider can reach; traffic to it must be routed
    /// to `webhook_server_url`
    pub authorization_callback_domain: String,
    /// OAuth redirect path off the callback domain
    pub callback_path: String,
    /// Webhook path off the callback domain
    pub webhook_path: String,
    /// Where the local webhook server listens
    pub webhook_server_url: String,
    /// Shared secret for webhook verification
    pub webhook_verify_token: String,
    /// OAuth scopes requested on approval
    pub scopes: Vec<String>,
    /// Token file used by data commands
    pub token_path: Option<PathBuf>,
    /// Explicit OAuth redirect URL; derived from the callback domain when unset
    pub redirect_url: Option<String>,
    /// Provider API base URL
    pub api_base_url: String,
    /// Provider OAuth base URL
    pub oauth_base_url: String,
    /// Handshake wait when the caller gives no deadline
    pub handshake_timeout_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_callback_domain: String::new(),
            callback_path: DEFAULT_CALLBACK_PATH.to_owned(),
            webhook_path: DEFAULT_WEBHOOK_PATH.to_owned(),
            webhook_server_url: DEFAULT_SERVER_URL.to_owned(),
            webhook_verify_token: DEFAULT_VERIFY_TOKEN.to_owned(),
            scopes: vec![DEFAULT_SCOPE.to_owned()],
            token_path: None,
            redirect_url: None,
            api_base_url: API_BASE.to_owned(),
            oauth_base_url: OAUTH_BASE.to_owned(),
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        }
    }
}

impl ConnectorConfig {
    /// `$HOME/.cassidy-connector-strava.json`, if a home directory exists
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
    }

    /// Read a JSON config file on top of the defaults
    ///
    /// Empty strings and empty lists in the file keep the default value.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a serialization
    /// error if it is not valid JSON
    pub fn from_file(path: impl AsRef<Path>) -> ConnectorResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading config file");
        let contents = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&contents)?;
        config.fill_blanks();
        Ok(config)
    }

    /// Defaults plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an environment value is malformed
    pub fn from_env() -> ConnectorResult<Self> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load the config file, then apply environment overrides
    ///
    /// An explicit `path` must exist. Without one the default file is used
    /// when present and silently skipped otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any source is
    /// malformed
    pub fn load(path: Option<&Path>) -> ConnectorResult<Self> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|candidate| candidate.is_file()),
        };

        let mut config = match file {
            Some(file) => {
                info!(path = %file.display(), "loading configuration file");
                Self::from_file(file)?
            }
            None => Self::default(),
        };

        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn fill_blanks(&mut self) {
        let defaults = Self::default();
        let fill = |value: &mut String, default: String| {
            if value.trim().is_empty() {
                *value = default;
            }
        };
        fill(&mut self.callback_path, defaults.callback_path);
        fill(&mut self.webhook_path, defaults.webhook_path);
        fill(&mut self.webhook_server_url, defaults.webhook_server_url);
        fill(&mut self.webhook_verify_token, defaults.webhook_verify_token);
        fill(&mut self.api_base_url, defaults.api_base_url);
        fill(&mut self.oauth_base_url, defaults.oauth_base_url);
        if self.scopes.is_empty() {
            self.scopes = defaults.scopes;
        }
        if self.redirect_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            self.redirect_url = None;
        }
    }

    /// Check that application credentials are present and the callback
    /// domain, when set, is a URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing or malformed values
    pub fn validate(&self) -> ConnectorResult<()> {
        let missing: Vec<&str> = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ConnectorError::config(format!(
                "missing {}",
                missing.join(" and ")
            )));
        }
        self.redirect_url().map(|_| ())
    }

    /// OAuth redirect URL
    ///
    /// The explicit `redirect_url` wins; otherwise the callback domain joined
    /// with `callback_path`; otherwise a localhost fallback.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the callback domain is not a URL
    pub fn redirect_url(&self) -> ConnectorResult<String> {
        if let Some(url) = &self.redirect_url {
            return Ok(url.clone());
        }
        if self.authorization_callback_domain.trim().is_empty() {
            return Ok(DEFAULT_REDIRECT_URL.to_owned());
        }
        join_url(&self.authorization_callback_domain, &self.callback_path)
    }

    /// Public webhook callback URL: the callback domain joined with
    /// `webhook_path`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no callback domain is set or it is
    /// not a URL
    pub fn webhook_callback_url(&self) -> ConnectorResult<String> {
        if self.authorization_callback_domain.trim().is_empty() {
            return Err(ConnectorError::config(
                "authorization_callback_domain is required for webhooks",
            ));
        }
        join_url(&self.authorization_callback_domain, &self.webhook_path)
    }

    /// Handshake wait when the caller gives no deadline
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// OAuth client settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the redirect URL cannot be built
    pub fn oauth_config(&self) -> ConnectorResult<OAuth2Config> {
        Ok(OAuth2Config::with_oauth_base(
            &self.oauth_base_url,
            self.client_id.clone(),
            self.client_secret.clone(),
            self.redirect_url()?,
            self.scopes.clone(),
        ))
    }

    /// Webhook server and subscription settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no callback domain is set
    pub fn webhook_config(&self) -> ConnectorResult<WebhookConfig> {
        let mut config = WebhookConfig::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.webhook_callback_url()?,
        );
        config.server_url.clone_from(&self.webhook_server_url);
        config.verify_token.clone_from(&self.webhook_verify_token);
        config.api_base_url.clone_from(&self.api_base_url);
        config.handshake_timeout = self.handshake_timeout();
        Ok(config)
    }
}

/// Append `path` to `base`, keeping any path prefix `base` already has
fn join_url(base: &str, path: &str) -> ConnectorResult<String> {
    let mut base = Url::parse(base.trim()).map_err(|e| {
        ConnectorError::config(format!("invalid authorization_callback_domain {base}: {e}"))
    })?;
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    let joined = base
        .join(path.trim_start_matches('/'))
        .map_err(|e| ConnectorError::config(format!("invalid path {path}: {e}")))?;
    Ok(joined.into())
}
