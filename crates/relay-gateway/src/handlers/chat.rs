//! `chat message` handler

use super::{HandlerError, HandlerResult, MessageDispatcher};
use crate::connection::Connection;
use crate::events::{ChatMessageEvent, OutboundEvent};
use crate::protocol::ChatMessagePayload;

/// Handles `chat message` messages
pub struct ChatMessageHandler;

impl ChatMessageHandler {
    /// Relay a chat line to every connection, sender included
    pub fn handle(
        dispatcher: &MessageDispatcher,
        connection: &Connection,
        payload: ChatMessagePayload,
    ) -> HandlerResult<()> {
        let registry = dispatcher.registry();
        let Some(identity) = registry.identity_of(connection.id()) else {
            return Err(if registry.contains(connection.id()) {
                HandlerError::NotNamed
            } else {
                HandlerError::ConnectionNotFound
            });
        };

        let text = payload
            .message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(HandlerError::InvalidMessage)?;

        let sent = dispatcher.broadcaster().send_to_all(|at| {
            let event = ChatMessageEvent {
                user_id: identity.connection_id,
                user_name: identity.display_name,
                user_message: text.to_string(),
                timestamp: at,
            };
            OutboundEvent::chat_message(&event, at)
        });

        tracing::debug!(
            connection_id = %connection.id(),
            client_message_id = payload.id.as_deref().unwrap_or_default(),
            sent = sent,
            "Chat message relayed"
        );

        Ok(())
    }
}
