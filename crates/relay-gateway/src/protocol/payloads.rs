//! Client payload definitions
//!
//! The `data` shapes for each inbound message type.

use serde::Deserialize;

/// `set name` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SetNamePayload {
    /// Requested display name (trimmed by the registry)
    #[serde(default)]
    pub name: Option<String>,
}

/// `chat message` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatMessagePayload {
    /// Client-side message id, echoed in logs only
    #[serde(default)]
    pub id: Option<String>,
    /// Message text
    #[serde(default)]
    pub message: Option<String>,
}

/// `typing` / `stop typing` payload
///
/// The broadcast state is derived from the message type; the client flag is
/// only compared against it for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default)]
    pub is_typing: Option<bool>,
}
