// ABOUTME: Data models shared by the API client and the webhook server
// ABOUTME: OAuth tokens, webhook events, subscription challenges, and activity stream keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Webhook event payloads
pub mod event;
/// Activity stream keys
pub mod stream;
/// Webhook subscription handshake values
pub mod subscription;
/// OAuth2 token
pub mod token;

pub use event::{AspectType, InboundEvent, ObjectType};
pub use stream::{parse_stream_keys, StreamType};
pub use subscription::{SubscriptionChallenge, SubscriptionCreated};
pub use token::Token;
