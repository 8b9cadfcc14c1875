// ABOUTME: Single-slot handoff of the verification challenge from the callback handler
// ABOUTME: to the subscription attempt waiting on it
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::{Mutex, MutexGuard, PoisonError};

use strava_core::{ConnectorError, ConnectorResult, SubscriptionChallenge};
use tokio::sync::oneshot;

/// Holds the sending half of the pending attempt's one-shot channel
#[derive(Debug, Default)]
pub struct ChallengeSlot {
    pending: Mutex<Option<oneshot::Sender<SubscriptionChallenge>>>,
}

impl ChallengeSlot {
    /// Empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<SubscriptionChallenge>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a waiting attempt and return the receiving half
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionHandshakeFailed` if another attempt is still
    /// waiting on this slot
    pub fn arm(&self) -> ConnectorResult<oneshot::Receiver<SubscriptionChallenge>> {
        let mut pending = self.lock();
        if pending.as_ref().is_some_and(|sender| !sender.is_closed()) {
            return Err(ConnectorError::handshake_failed(
                "a subscription attempt is already in progress",
            ));
        }
        let (sender, receiver) = oneshot::channel();
        *pending = Some(sender);
        Ok(receiver)
    }

    /// Hand a challenge to the waiting attempt
    ///
    /// Returns `false` when nobody is waiting; the challenge is dropped.
    pub fn deliver(&self, challenge: SubscriptionChallenge) -> bool {
        self.lock()
            .take()
            .is_some_and(|sender| sender.send(challenge).is_ok())
    }

    /// Drop any registered attempt
    pub fn disarm(&self) {
        self.lock().take();
    }

    /// Whether an attempt is currently waiting
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.lock().as_ref().is_some_and(|sender| !sender.is_closed())
    }
}
