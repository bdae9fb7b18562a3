//! Message handlers
//!
//! Handles incoming client envelopes based on their `type`.

mod chat;
mod error;
mod set_name;
mod typing;

pub use chat::ChatMessageHandler;
pub use error::{HandlerError, HandlerResult};
pub use set_name::SetNameHandler;
pub use typing::TypingHandler;

use crate::broadcast::Broadcaster;
use crate::connection::{Connection, SessionRegistry};
use crate::protocol::{ClientEnvelope, InboundType};
use std::sync::Arc;

/// Dispatch incoming client envelopes to the appropriate handlers
#[derive(Clone)]
pub struct MessageDispatcher {
    registry: Arc<SessionRegistry>,
    broadcaster: Broadcaster,
}

impl MessageDispatcher {
    /// Create a dispatcher sharing the broadcaster's registry and clock
    pub fn new(registry: Arc<SessionRegistry>, broadcaster: Broadcaster) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Get the session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Get the broadcaster
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Handle one raw inbound frame
    ///
    /// Any failure is reported to the sender as an `error` event and then
    /// returned so the caller can log it. Failures never close the connection.
    pub fn handle_frame(&self, connection: &Connection, frame: &[u8]) -> HandlerResult<()> {
        let result = ClientEnvelope::from_slice(frame)
            .map_err(|e| HandlerError::InvalidEnvelope(e.to_string()))
            .and_then(|envelope| self.dispatch(connection, &envelope));

        if let Err(err) = &result {
            tracing::debug!(
                connection_id = %connection.id(),
                error = %err,
                details = err.details().unwrap_or_default(),
                "Rejected client message"
            );
            self.broadcaster
                .send_to_one(connection.id(), |at| err.to_event(at));
        }

        result
    }

    /// Route a decoded envelope to its handler
    pub fn dispatch(&self, connection: &Connection, envelope: &ClientEnvelope) -> HandlerResult<()> {
        let Some(kind) = envelope.message_type() else {
            return Err(HandlerError::UnknownMessageType(envelope.kind.clone()));
        };

        tracing::trace!(connection_id = %connection.id(), kind = %kind, "Dispatching message");

        match kind {
            InboundType::SetName => {
                let payload = envelope.as_set_name().unwrap_or_default();
                SetNameHandler::handle(self, connection, payload)
            }
            InboundType::ChatMessage => {
                let payload = envelope.as_chat_message().unwrap_or_default();
                ChatMessageHandler::handle(self, connection, payload)
            }
            InboundType::Typing | InboundType::StopTyping => {
                let payload = envelope.as_typing().unwrap_or_default();
                TypingHandler::handle(self, connection, kind, payload)
            }
        }
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
