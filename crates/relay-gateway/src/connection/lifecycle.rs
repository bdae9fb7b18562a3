//! Connection lifecycle
//!
//! Drives each connection through accept, message handling and close.
//! The transport calls in here; nothing in here awaits.

use super::{Connection, ConnectionId, OutboundChannel, SessionRegistry};
use crate::broadcast::Broadcaster;
use crate::events::MonotonicClock;
use crate::handlers::MessageDispatcher;
use crate::protocol::CloseCode;
use std::fmt;
use std::sync::Arc;

/// Lifecycle failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("connection limit reached ({limit})")]
    AtCapacity { limit: usize },
}

/// Owns the relay's shared state and exposes the transport-facing operations
#[derive(Clone)]
pub struct ConnectionLifecycle {
    registry: Arc<SessionRegistry>,
    broadcaster: Broadcaster,
    dispatcher: MessageDispatcher,
    max_connections: usize,
}

impl ConnectionLifecycle {
    /// Create a lifecycle manager with fresh registry state
    pub fn new(max_connections: usize) -> Self {
        let registry = SessionRegistry::new_shared();
        let broadcaster = Broadcaster::new(registry.clone(), MonotonicClock::new());
        let dispatcher = MessageDispatcher::new(registry.clone(), broadcaster.clone());

        Self {
            registry,
            broadcaster,
            dispatcher,
            max_connections,
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

    /// Get the message dispatcher
    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    /// Configured connection limit
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Whether another connection would exceed the limit
    pub fn is_full(&self) -> bool {
        self.registry.count() >= self.max_connections
    }

    /// Accept a new transport channel
    ///
    /// Generates a fresh ID, opens the connection and registers it unnamed.
    /// Nothing is sent to the peer until it names itself.
    pub fn accept(
        &self,
        outbound: impl OutboundChannel + 'static,
    ) -> Result<Arc<Connection>, LifecycleError> {
        if self.is_full() {
            tracing::warn!(limit = self.max_connections, "Connection rejected, at capacity");
            return Err(LifecycleError::AtCapacity {
                limit: self.max_connections,
            });
        }

        let connection = Connection::new(ConnectionId::generate(), outbound);
        connection.mark_open();
        self.registry.register(connection.clone());

        tracing::info!(
            connection_id = %connection.id(),
            connections = self.registry.count(),
            "Connection accepted"
        );

        Ok(connection)
    }

    /// Handle one inbound frame, in arrival order for its connection
    pub fn on_message(&self, connection: &Connection, frame: &[u8]) {
        // Errors were already reported to the sender
        let _ = self.dispatcher.handle_frame(connection, frame);
    }

    /// Handle an orderly close from the transport
    ///
    /// Returns `false` if the connection was already closed.
    pub fn on_close(&self, id: &ConnectionId) -> bool {
        let closed = self.close(id);
        if closed {
            tracing::info!(connection_id = %id, "Connection closed");
        }
        closed
    }

    /// Handle a transport error; same effect as a close
    pub fn on_error(&self, id: &ConnectionId, error: &dyn fmt::Display) -> bool {
        let closed = self.close(id);
        if closed {
            tracing::warn!(connection_id = %id, error = %error, "Connection closed on error");
        }
        closed
    }

    /// Close a connection from the server side
    pub fn force_disconnect(&self, id: &ConnectionId, code: CloseCode) -> bool {
        let Some(connection) = self.registry.connection(id) else {
            return false;
        };
        if !self.close(id) {
            return false;
        }

        connection.close_transport(code);
        tracing::info!(connection_id = %id, code = %code, "Connection force-disconnected");
        true
    }

    /// Disconnect every live connection with `GoingAway`
    pub fn shutdown(&self) -> usize {
        let connections = self.registry.connections();
        let closed = connections
            .iter()
            .filter(|conn| self.force_disconnect(conn.id(), CloseCode::GoingAway))
            .count();

        tracing::info!(closed = closed, "All connections disconnected");
        closed
    }

    fn close(&self, id: &ConnectionId) -> bool {
        let Some(connection) = self.registry.connection(id) else {
            return false;
        };
        if !connection.begin_close() {
            return false;
        }

        let departure = self.registry.take(id);
        let had_identity = departure.is_some_and(|d| d.identity.is_some());
        if had_identity {
            self.broadcaster.broadcast_roster();
        }

        connection.mark_closed();
        tracing::debug!(
            connection_id = %id,
            named = had_identity,
            age_ms = connection.age().as_millis() as u64,
            "Connection released"
        );
        true
    }
}

impl fmt::Debug for ConnectionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLifecycle")
            .field("registry", &self.registry)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}
