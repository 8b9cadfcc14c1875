// ABOUTME: Webhook event payload delivered by the provider on activity and athlete changes
// ABOUTME: Typed object and aspect kinds with the free-form updates map kept as strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of object an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// `object_id` is an activity id
    Activity,
    /// `object_id` is an athlete id
    Athlete,
}

/// What happened to the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    /// Object was created
    Create,
    /// Object changed; see `InboundEvent::updates`
    Update,
    /// Object was deleted
    Delete,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Activity => "activity",
            Self::Athlete => "athlete",
        })
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Event pushed to the webhook callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Whether `object_id` names an activity or an athlete
    pub object_type: ObjectType,
    /// Activity or athlete id
    pub object_id: i64,
    /// Create, update, or delete
    pub aspect_type: AspectType,
    /// Changed fields for updates: `title`, `type`, `private`, `authorized`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub updates: HashMap<String, String>,
    /// Athlete who owns the object
    pub owner_id: i64,
    /// Push subscription that received the event
    pub subscription_id: i64,
    /// Epoch seconds when the event occurred
    pub event_time: i64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl InboundEvent {
    /// Whether this is an athlete revoking the application's access
    #[must_use]
    pub fn is_deauthorization(&self) -> bool {
        self.object_type == ObjectType::Athlete
            && self.aspect_type == AspectType::Update
            && self.updates.get("authorized").map(String::as_str) == Some("false")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_round_trips_field_for_field() {
        let event = InboundEvent {
            object_type: ObjectType::Activity,
            object_id: 1_360_128_428,
            aspect_type: AspectType::Update,
            updates: HashMap::from([
                ("title".to_owned(), "Messy".to_owned()),
                ("type".to_owned(), "Run".to_owned()),
            ]),
            owner_id: 134_815,
            subscription_id: 120_475,
            event_time: 1_516_126_040,
        };

        let json = serde_json::to_string(&event).expect("serialize");
        let parsed: InboundEvent = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, event);
    }

    #[test]
    fn updates_default_to_empty() {
        let json = r#"{"object_type":"activity","object_id":1,"aspect_type":"create","owner_id":2,"subscription_id":3,"event_time":4}"#;
        let event: InboundEvent = serde_json::from_str(json).expect("parse");
        assert!(event.updates.is_empty());
        assert_eq!(event.aspect_type, AspectType::Create);
    }

    #[test]
    fn detects_deauthorization() {
        let json = r#"{"object_type":"athlete","object_id":9,"aspect_type":"update","updates":{"authorized":"false"},"owner_id":9,"subscription_id":3,"event_time":4}"#;
        let event: InboundEvent = serde_json::from_str(json).expect("parse");
        assert!(event.is_deauthorization());
    }

    #[test]
    fn null_updates_become_empty() {
        let json = r#"{"object_type":"activity","object_id":1,"aspect_type":"delete","updates":null,"owner_id":2,"subscription_id":3,"event_time":4}"#;
        let event: InboundEvent = serde_json::from_str(json).expect("parse");
        assert!(event.updates.is_empty());
        assert_eq!(event.aspect_type, AspectType::Delete);
    }

    #[test]
    fn rejects_unknown_object_types() {
        let json = r#"{"object_type":"segment","object_id":1,"aspect_type":"create","owner_id":2,"subscription_id":3,"event_time":4}"#;
        assert!(serde_json::from_str::<InboundEvent>(json).is_err());
    }
}
