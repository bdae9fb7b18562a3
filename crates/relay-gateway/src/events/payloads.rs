//! Event payload definitions
//!
//! Defines the `data` structures for each outbound event type.

use crate::connection::{ConnectionId, Identity};
use serde::Serialize;

/// `name set` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameSetEvent {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NameSetEvent {
    #[must_use]
    pub fn accepted(name: impl Into<String>) -> Self {
        Self {
            success: true,
            name: Some(name.into()),
        }
    }
}

/// `chat message` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEvent {
    pub user_id: ConnectionId,
    pub user_name: String,
    pub user_message: String,
    /// Server-assigned, milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// One row of the `users list` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub id: ConnectionId,
    pub name: String,
}

impl From<Identity> for RosterEntry {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.connection_id,
            name: identity.display_name,
        }
    }
}

/// `user typing` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingEvent {
    pub is_typing: bool,
    pub user_name: String,
}

/// `error` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEvent {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_field_names() {
        let event = ChatMessageEvent {
            user_id: ConnectionId::from("c1"),
            user_name: "Alice".to_string(),
            user_message: "hi".to_string(),
            timestamp: 42,
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"userId": "c1", "userName": "Alice", "userMessage": "hi", "timestamp": 42})
        );
    }

    #[test]
    fn test_typing_field_names() {
        let event = UserTypingEvent {
            is_typing: false,
            user_name: "Bob".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"isTyping": false, "userName": "Bob"})
        );
    }

    #[test]
    fn test_error_details_omitted_when_absent() {
        let plain = serde_json::to_value(ErrorEvent::new("invalid message")).unwrap();
        assert_eq!(plain, json!({"message": "invalid message"}));

        let detailed =
            serde_json::to_value(ErrorEvent::new("unknown message type").with_details("bogus"))
                .unwrap();
        assert_eq!(detailed["details"], "bogus");
    }

    #[test]
    fn test_roster_entry_from_identity() {
        let entry = RosterEntry::from(Identity {
            connection_id: ConnectionId::from("c9"),
            display_name: "Zed".to_string(),
        });
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!({"id": "c9", "name": "Zed"}));
    }
}
