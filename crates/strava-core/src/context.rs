// ABOUTME: Per-call context carrying an optional deadline through API and webhook operations
// ABOUTME: Uses the tokio clock so paused-time tests drive deadlines deterministically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;
use tokio::time::Instant;

/// Deadline attached to a single logical call
///
/// A context without a deadline waits as long as it takes. Rate limiting and
/// the subscription handshake both honor the deadline and fail instead of
/// waiting past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context with no deadline
    #[must_use]
    pub const fn background() -> Self {
        Self { deadline: None }
    }

    /// Context that expires `timeout` from now
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Context that expires at `deadline`
    #[must_use]
    pub const fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; zero once it has passed
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has already passed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Whether waiting `wait` from now would overshoot the deadline
    #[must_use]
    pub fn would_exceed(&self, wait: Duration) -> bool {
        self.deadline.is_some_and(|deadline| {
            Instant::now()
                .checked_add(wait)
                .is_none_or(|end| end > deadline)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_expires_with_the_tokio_clock() {
        let ctx = CallContext::with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_expired());
        assert!(!ctx.would_exceed(Duration::from_secs(4)));
        assert!(ctx.would_exceed(Duration::from_secs(6)));
        assert!(ctx.would_exceed(Duration::MAX));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn background_never_expires() {
        let ctx = CallContext::background();
        assert!(!ctx.is_expired());
        assert!(!ctx.would_exceed(Duration::from_secs(u64::from(u32::MAX))));
        assert_eq!(ctx.remaining(), None);
    }
}
