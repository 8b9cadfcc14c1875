// ABOUTME: Values exchanged during the webhook subscription handshake
// ABOUTME: The verification challenge query and the provider's creation response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Verification request sent by the provider to the callback URL
///
/// Deserializes directly from the `hub.*` query parameters. It is produced once
/// by the callback handler and consumed once by the pending subscription call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionChallenge {
    /// Nonce that must be echoed back
    #[serde(rename = "hub.challenge")]
    pub hub_challenge: String,
    /// Token the subscription was created with
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    /// Always `subscribe`
    #[serde(rename = "hub.mode", default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Body of a successful subscription creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCreated {
    /// Subscription id
    pub id: i64,
}
