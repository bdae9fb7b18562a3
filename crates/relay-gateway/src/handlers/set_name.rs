//! `set name` handler

use super::{HandlerError, HandlerResult, MessageDispatcher};
use crate::connection::Connection;
use crate::events::{NameSetEvent, OutboundEvent};
use crate::protocol::SetNamePayload;

/// Handles `set name` messages
pub struct SetNameHandler;

impl SetNameHandler {
    /// Claim a display name for the sender
    ///
    /// On success the sender gets `name set` first, then everyone gets the
    /// updated roster.
    pub fn handle(
        dispatcher: &MessageDispatcher,
        connection: &Connection,
        payload: SetNamePayload,
    ) -> HandlerResult<()> {
        let requested = payload.name.ok_or(HandlerError::InvalidName)?;

        let identity = dispatcher
            .registry()
            .claim_name(connection.id(), &requested)
            .map_err(HandlerError::from)?;

        tracing::info!(
            connection_id = %connection.id(),
            name = %identity.display_name,
            "Name set"
        );

        let reply = NameSetEvent::accepted(identity.display_name);
        dispatcher
            .broadcaster()
            .send_to_one(connection.id(), |at| OutboundEvent::name_set(&reply, at));
        dispatcher.broadcaster().broadcast_roster();

        Ok(())
    }
}
