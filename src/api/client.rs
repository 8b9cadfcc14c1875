// ABOUTME: Rate-limited, token-refreshing client for the provider's athlete and activity endpoints
// ABOUTME: Walks paginated listings to the first empty page and validates stream keys up front
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strava_core::constants::strava_urls::API_BASE;
use strava_core::models::parse_stream_keys;
use strava_core::{CallContext, ConnectorResult};
use tracing::{debug, instrument};

use super::pagination::{ActivityQuery, PageCursor};
use crate::oauth2_client::TokenSource;
use crate::rate_limiting::RateLimiter;
use crate::utils::http_client::{api_client, apply_deadline, ensure_success};

/// Client for the provider's REST API
///
/// Every request goes through the same three steps, in order: admission by
/// the rate limiter, a token from the token source, then the HTTP call. A
/// failed refresh therefore still spends rate-limit budget.
///
/// Payloads are returned as raw JSON values.
#[derive(Clone)]
pub struct StravaApi {
    http: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    tokens: Arc<dyn TokenSource>,
}

impl StravaApi {
    /// Client against the production API with the provider's published quota
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_base_url(API_BASE, Arc::new(RateLimiter::strava()), tokens)
    }

    /// Client against another API base URL with a caller-supplied limiter
    #[must_use]
    pub fn with_base_url(
        base_url: impl Into<String>,
        limiter: Arc<RateLimiter>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http: api_client(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            limiter,
            tokens,
        }
    }

    /// Whole requests left as `(15-minute, daily)`
    #[must_use]
    pub fn remaining_requests(&self) -> (u32, u32) {
        self.limiter.remaining_requests()
    }

    /// The authenticated athlete
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded`, `TokenRefreshFailed`, `NotFound`, or
    /// `RequestFailed`
    #[instrument(skip(self, ctx), fields(api_call = "get_athlete"))]
    pub async fn get_athlete(&self, ctx: &CallContext) -> ConnectorResult<Value> {
        self.get(ctx, "athlete", &[], "athlete").await
    }

    /// Every activity page matching the filters
    ///
    /// Pages are fetched from page 1 until the provider returns an empty page.
    /// The empty page is fetched but not returned. Each page is admitted by
    /// the rate limiter separately.
    ///
    /// # Errors
    ///
    /// Returns the first error hit on any page; pages fetched before it are
    /// discarded
    #[instrument(skip(self, ctx), fields(api_call = "list_activities"))]
    pub async fn list_activities(
        &self,
        ctx: &CallContext,
        per_page: u32,
        before: Option<DateTime<Utc>>,
        after: Option<DateTime<Utc>>,
    ) -> ConnectorResult<Vec<Vec<Value>>> {
        let query = ActivityQuery::new(per_page).before(before).after(after);
        let mut cursor = PageCursor::start();
        let mut pages = Vec::new();

        loop {
            let params = query.params(&cursor);
            let page: Vec<Value> = self
                .get(ctx, "athlete/activities", &params, "activities")
                .await?;

            if page.is_empty() {
                debug!(page = cursor.page(), "reached end of activities");
                break;
            }

            debug!(page = cursor.page(), count = page.len(), "fetched activities page");
            pages.push(page);
            cursor.advance();
        }

        Ok(pages)
    }

    /// A single activity
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the provider has no such activity, or any of the
    /// errors of [`StravaApi::get_athlete`]
    #[instrument(skip(self, ctx), fields(api_call = "get_activity"))]
    pub async fn get_activity(
        &self,
        ctx: &CallContext,
        activity_id: i64,
        include_all_efforts: bool,
    ) -> ConnectorResult<Value> {
        let params = [("include_all_efforts", include_all_efforts.to_string())];
        self.get(
            ctx,
            &format!("activities/{activity_id}"),
            &params,
            &format!("activity {activity_id}"),
        )
        .await
    }

    /// Recorded streams of an activity, keyed by stream type
    ///
    /// Keys are validated before anything else happens, so an invalid key
    /// costs no rate-limit budget and makes no request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStreamType` for an unsupported key, or any of the
    /// errors of [`StravaApi::get_activity`]
    #[instrument(skip(self, ctx, keys), fields(api_call = "get_activity_streams"))]
    pub async fn get_activity_streams<S: AsRef<str> + Sync>(
        &self,
        ctx: &CallContext,
        activity_id: i64,
        keys: &[S],
    ) -> ConnectorResult<Value> {
        let streams = parse_stream_keys(keys)?;
        let joined = streams
            .iter()
            .map(|stream| stream.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let params = [("keys", joined), ("key_by_type", "true".to_owned())];
        self.get(
            ctx,
            &format!("activities/{activity_id}/streams"),
            &params,
            &format!("streams for activity {activity_id}"),
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        params: &[(&str, String)],
        resource: &str,
    ) -> ConnectorResult<T> {
        self.limiter.wait(ctx).await?;
        let token = self.tokens.current_token(ctx).await?;

        let url = format!("{}/{path}", self.base_url);
        let request = self
            .http
            .get(&url)
            .bearer_auth(&token.access_token)
            .query(params);

        let response = apply_deadline(request, ctx).send().await?;
        let response = ensure_success(response, resource).await?;
        Ok(response.json().await?)
    }
}
