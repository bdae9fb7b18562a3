//! Server envelope
//!
//! Every outbound frame is `{ "type": <EventKind>, "data": <payload>, "timestamp": millis }`.

use super::{
    ChatMessageEvent, ErrorEvent, EventKind, NameSetEvent, RosterEntry, UserTypingEvent,
};
use serde::Serialize;
use serde_json::Value;

/// Event sent to one or more clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    /// Event type
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Event data payload
    pub data: Value,

    /// Emission time, milliseconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub emitted_at_millis: i64,
}

impl OutboundEvent {
    /// Build an event from any serializable payload
    pub fn new<T: Serialize>(
        kind: EventKind,
        payload: &T,
        emitted_at_millis: i64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind,
            data: serde_json::to_value(payload)?,
            emitted_at_millis,
        })
    }

    /// Create a `name set` event
    pub fn name_set(payload: &NameSetEvent, at: i64) -> Result<Self, serde_json::Error> {
        Self::new(EventKind::NameSet, payload, at)
    }

    /// Create a `chat message` event
    pub fn chat_message(payload: &ChatMessageEvent, at: i64) -> Result<Self, serde_json::Error> {
        Self::new(EventKind::ChatMessage, payload, at)
    }

    /// Create a `users list` event
    pub fn users_list(roster: &[RosterEntry], at: i64) -> Result<Self, serde_json::Error> {
        Self::new(EventKind::UsersList, &roster, at)
    }

    /// Create a `user typing` event
    pub fn user_typing(payload: &UserTypingEvent, at: i64) -> Result<Self, serde_json::Error> {
        Self::new(EventKind::UserTyping, payload, at)
    }

    /// Create an `error` event
    pub fn error(payload: &ErrorEvent, at: i64) -> Result<Self, serde_json::Error> {
        Self::new(EventKind::Error, payload, at)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl std::fmt::Display for OutboundEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OutboundEvent(type={}, ts={})", self.kind, self.emitted_at_millis)
    }
}
