// ABOUTME: Dual-window rate limiter mirroring the provider's 15 minute and daily read quotas
// ABOUTME: Continuous token-bucket refill with deadline-aware cooperative waiting
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Rate Limiting
//!
//! Every provider call is admitted by a [`RateLimiter`] before it goes out. The
//! limiter holds two windows, each a token bucket that refills continuously:
//!
//! ```text
//! available(t) = min(capacity, available_at_refill + elapsed * refill_rate)
//! ```
//!
//! A call is admitted only when both windows hold at least one token, and then
//! one token is taken from each. The daily window is checked first. When a
//! window is short the caller sleeps until it refills, then both windows are
//! checked again. If the required sleep would overshoot the caller's deadline
//! the limiter fails right away with `RateLimitExceeded`.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use strava_core::constants::rate_limits::{
    DAILY_CAPACITY, DAILY_PERIOD, SHORT_TERM_CAPACITY, SHORT_TERM_PERIOD,
};
use strava_core::{CallContext, ConnectorError, ConnectorResult};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Fraction of a token treated as rounding noise when comparing balances
const TOKEN_EPSILON: f64 = 1e-6;

/// Name of the short window in logs and errors
pub const SHORT_TERM_WINDOW: &str = "15-minute";
/// Name of the daily window in logs and errors
pub const DAILY_WINDOW: &str = "daily";

/// Capacity and refill period of one quota window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum tokens held, and the starting balance
    pub capacity: u32,
    /// Time to refill from empty to full
    pub period: Duration,
}

impl WindowConfig {
    /// Window holding `capacity` tokens that refills over `period`
    #[must_use]
    pub const fn new(capacity: u32, period: Duration) -> Self {
        Self { capacity, period }
    }

    /// Tokens added per second
    #[must_use]
    pub fn refill_rate(&self) -> f64 {
        f64::from(self.capacity) / self.period.as_secs_f64()
    }
}

#[derive(Debug)]
struct Window {
    name: &'static str,
    capacity: f64,
    refill_rate: f64,
    available: f64,
    last_refill: Instant,
}

impl Window {
    fn new(name: &'static str, config: WindowConfig, now: Instant) -> Self {
        Self {
            name,
            capacity: f64::from(config.capacity),
            refill_rate: config.refill_rate(),
            available: f64::from(config.capacity),
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.available = elapsed
            .mul_add(self.refill_rate, self.available)
            .min(self.capacity);
        self.last_refill = now;
    }

    /// Time until one whole token is available, zero if it already is
    fn wait_time(&self) -> Duration {
        let deficit = 1.0 - self.available;
        if deficit <= TOKEN_EPSILON {
            return Duration::ZERO;
        }
        if self.refill_rate <= 0.0 {
            return Duration::MAX;
        }
        Duration::try_from_secs_f64(deficit / self.refill_rate).unwrap_or(Duration::MAX)
    }

    fn take(&mut self) {
        self.available = (self.available - 1.0).max(0.0);
    }

    fn whole_tokens(&self) -> u32 {
        (self.available + TOKEN_EPSILON).floor() as u32
    }
}

#[derive(Debug)]
struct Windows {
    daily: Window,
    short_term: Window,
}

impl Windows {
    /// Refill both windows; on success take a token from each, otherwise
    /// report the first blocking window and how long it needs
    fn try_admit(&mut self, now: Instant) -> Result<(), (&'static str, Duration)> {
        self.daily.refill(now);
        self.short_term.refill(now);

        for window in [&self.daily, &self.short_term] {
            let wait = window.wait_time();
            if !wait.is_zero() {
                return Err((window.name, wait));
            }
        }

        self.daily.take();
        self.short_term.take();
        Ok(())
    }
}

/// Admission control for provider calls
///
/// Cheap to share behind an `Arc`; the bucket state sits behind a mutex that
/// is never held across an await.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<Windows>,
}

impl RateLimiter {
    /// Limiter with custom windows, both starting full
    #[must_use]
    pub fn new(short_term: WindowConfig, daily: WindowConfig) -> Self {
        let now = Instant::now();
        Self {
            windows: Mutex::new(Windows {
                daily: Window::new(DAILY_WINDOW, daily, now),
                short_term: Window::new(SHORT_TERM_WINDOW, short_term, now),
            }),
        }
    }

    /// Limiter matching the provider's published read quota:
    /// 300 requests per 15 minutes and 3000 per day
    #[must_use]
    pub fn strava() -> Self {
        Self::new(
            WindowConfig::new(SHORT_TERM_CAPACITY, SHORT_TERM_PERIOD),
            WindowConfig::new(DAILY_CAPACITY, DAILY_PERIOD),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until both windows can admit one request, then consume it
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded` when the wait needed would run past the
    /// deadline carried by `ctx`; no token is consumed in that case
    pub async fn wait(&self, ctx: &CallContext) -> ConnectorResult<()> {
        loop {
            let admission = self.lock().try_admit(Instant::now());
            let (window, wait) = match admission {
                Ok(()) => return Ok(()),
                Err(blocked) => blocked,
            };

            if ctx.would_exceed(wait) {
                warn!(
                    window,
                    wait_ms = wait.as_millis(),
                    "rate limit wait would exceed the call deadline"
                );
                return Err(ConnectorError::rate_limit_exceeded(window, wait));
            }

            debug!(window, wait_ms = wait.as_millis(), "waiting for rate limit window to refill");
            sleep(wait).await;
        }
    }

    /// Whole requests currently available as `(15-minute, daily)`
    #[must_use]
    pub fn remaining_requests(&self) -> (u32, u32) {
        let mut windows = self.lock();
        let now = Instant::now();
        windows.daily.refill(now);
        windows.short_term.refill(now);
        (
            windows.short_term.whole_tokens(),
            windows.daily.whole_tokens(),
        )
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::strava()
    }
}
