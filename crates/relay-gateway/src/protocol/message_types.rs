//! Inbound message types
//!
//! The `type` values a client may send.

use std::fmt;

/// Message types accepted from clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundType {
    /// Claim or change the display name
    SetName,
    /// Broadcast a chat line
    ChatMessage,
    /// Started typing
    Typing,
    /// Stopped typing
    StopTyping,
}

impl InboundType {
    /// Parse a wire `type` value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "set name" => Some(Self::SetName),
            "chat message" => Some(Self::ChatMessage),
            "typing" => Some(Self::Typing),
            "stop typing" => Some(Self::StopTyping),
            _ => None,
        }
    }

    /// Get the wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetName => "set name",
            Self::ChatMessage => "chat message",
            Self::Typing => "typing",
            Self::StopTyping => "stop typing",
        }
    }
}

impl fmt::Display for InboundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
