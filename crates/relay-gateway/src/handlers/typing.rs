//! `typing` / `stop typing` handler

use super::{HandlerResult, MessageDispatcher};
use crate::connection::Connection;
use crate::events::{OutboundEvent, UserTypingEvent};
use crate::protocol::{InboundType, TypingPayload};

/// Handles typing indicators
pub struct TypingHandler;

impl TypingHandler {
    /// Relay a typing indicator to everyone except the sender
    ///
    /// Indicators from unnamed connections are dropped without an error.
    pub fn handle(
        dispatcher: &MessageDispatcher,
        connection: &Connection,
        kind: InboundType,
        payload: TypingPayload,
    ) -> HandlerResult<()> {
        let Some(identity) = dispatcher.registry().identity_of(connection.id()) else {
            tracing::trace!(connection_id = %connection.id(), "Typing from unnamed connection ignored");
            return Ok(());
        };

        let is_typing = kind == InboundType::Typing;
        if payload.is_typing.is_some_and(|flag| flag != is_typing) {
            tracing::debug!(
                connection_id = %connection.id(),
                kind = %kind,
                "Client typing flag disagrees with message type"
            );
        }

        let event = UserTypingEvent {
            is_typing,
            user_name: identity.display_name,
        };
        dispatcher
            .broadcaster()
            .send_to_others(connection.id(), |at| OutboundEvent::user_typing(&event, at));

        Ok(())
    }
}
