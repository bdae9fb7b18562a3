//! Client envelope format
//!
//! Every inbound frame is `{ "type": string, "data": <payload>, "timestamp": millis }`.

use super::{ChatMessagePayload, InboundType, SetNamePayload, TypingPayload};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Envelope received from a client
///
/// The client-supplied `timestamp` is accepted but never read; the server
/// stamps everything it emits.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientEnvelope {
    /// Message type
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-specific payload
    #[serde(default)]
    pub data: Value,
}

impl ClientEnvelope {
    /// Deserialize from raw frame bytes
    ///
    /// Invalid UTF-8 inside the frame is reported as a decode error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Resolve the message type, `None` if unrecognized
    #[must_use]
    pub fn message_type(&self) -> Option<InboundType> {
        InboundType::parse(&self.kind)
    }

    // === Parsing Client Payloads ===

    /// Try to parse as a `set name` payload
    pub fn as_set_name(&self) -> Option<SetNamePayload> {
        self.payload_for(InboundType::SetName)
    }

    /// Try to parse as a `chat message` payload
    pub fn as_chat_message(&self) -> Option<ChatMessagePayload> {
        self.payload_for(InboundType::ChatMessage)
    }

    /// Try to parse as a `typing` or `stop typing` payload
    pub fn as_typing(&self) -> Option<TypingPayload> {
        match self.message_type()? {
            InboundType::Typing | InboundType::StopTyping => {
                // A bare envelope without data is still a valid typing signal
                if self.data.is_null() {
                    Some(TypingPayload::default())
                } else {
                    serde_json::from_value(self.data.clone()).ok()
                }
            }
            _ => None,
        }
    }

    fn payload_for<T: DeserializeOwned>(&self, expected: InboundType) -> Option<T> {
        if self.message_type() != Some(expected) {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }
}

impl std::fmt::Display for ClientEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClientEnvelope(type={})", self.kind)
    }
}
