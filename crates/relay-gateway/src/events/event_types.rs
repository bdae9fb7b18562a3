//! Relay event types
//!
//! Defines all event type names sent to clients.

use serde::Serialize;
use std::fmt;

/// Outbound event types
///
/// These are the values of the `type` field of every server envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// Reply to a successful `set name`
    #[serde(rename = "name set")]
    NameSet,
    /// A chat line from a named user
    #[serde(rename = "chat message")]
    ChatMessage,
    /// Current roster of named users
    #[serde(rename = "users list")]
    UsersList,
    /// Another user started or stopped typing
    #[serde(rename = "user typing")]
    UserTyping,
    /// Request rejected
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    /// Get the string representation of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameSet => "name set",
            Self::ChatMessage => "chat message",
            Self::UsersList => "users list",
            Self::UserTyping => "user typing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
