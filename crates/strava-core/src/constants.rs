// ABOUTME: Strava endpoint URLs, quota windows, pagination bounds, and webhook defaults
// ABOUTME: Centralizes provider numbers so the client and server agree on them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Provider endpoints
pub mod strava_urls {
    /// REST API base
    pub const API_BASE: &str = "https://www.strava.com/api/v3";
    /// OAuth base; `authorize` and `token` hang off it
    pub const OAUTH_BASE: &str = "https://www.strava.com/oauth";
    /// Authorization page, relative to `OAUTH_BASE`
    pub const AUTHORIZE_PATH: &str = "authorize";
    /// Token endpoint, relative to `OAUTH_BASE`
    pub const TOKEN_PATH: &str = "token";
    /// Webhook subscription endpoint, relative to `API_BASE`
    pub const PUSH_SUBSCRIPTIONS_PATH: &str = "push_subscriptions";
}

/// Read quota published by the provider
pub mod rate_limits {
    use std::time::Duration;

    /// Requests allowed per 15 minute window
    pub const SHORT_TERM_CAPACITY: u32 = 300;
    /// Length of the short window
    pub const SHORT_TERM_PERIOD: Duration = Duration::from_secs(15 * 60);
    /// Requests allowed per day
    pub const DAILY_CAPACITY: u32 = 3000;
    /// Length of the daily window
    pub const DAILY_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Page-number pagination bounds
pub mod pagination {
    /// The provider numbers pages from 1
    pub const FIRST_PAGE: u32 = 1;
    /// Smallest accepted page size
    pub const MIN_PER_PAGE: u32 = 1;
    /// Largest page size the provider serves
    pub const MAX_PER_PAGE: u32 = 200;
    /// Provider default page size
    pub const DEFAULT_PER_PAGE: u32 = 30;
}

/// OAuth parameters
pub mod oauth {
    /// Grant type for the one-time code exchange
    pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
    /// Grant type for refreshing
    pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
    /// Response type requested on the approval page
    pub const RESPONSE_TYPE: &str = "code";
    /// Always show the approval prompt
    pub const APPROVAL_PROMPT: &str = "force";
    /// Scope requested when none is configured
    pub const DEFAULT_SCOPE: &str = "activity:read_all";
    /// Token type assumed when the provider omits it
    pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
    /// Redirect used when no callback domain is configured
    pub const DEFAULT_REDIRECT_URL: &str = "http://localhost/exchange_token";
}

/// Local webhook server defaults
pub mod webhook {
    /// Liveness probe path
    pub const STATUS_PATH: &str = "/status";
    /// Liveness probe body
    pub const ALIVE_BODY: &str = "alive";
    /// Path events and challenges are delivered to
    pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
    /// Path the OAuth redirect lands on
    pub const DEFAULT_CALLBACK_PATH: &str = "/strava/callback";
    /// Where the local server listens
    pub const DEFAULT_SERVER_URL: &str = "http://localhost:8086";
    /// Shared secret echoed back by the provider's verification request
    pub const DEFAULT_VERIFY_TOKEN: &str = "STRAVA";
    /// How long a subscription attempt waits for the verification challenge
    pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 30;
}

/// Outbound HTTP client timeouts
pub mod http {
    /// Whole-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Connection timeout in seconds
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}
