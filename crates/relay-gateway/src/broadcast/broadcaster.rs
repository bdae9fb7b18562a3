//! Fan-out of server events to connections
//!
//! Each event is serialized once and written to every recipient from a
//! snapshot of the live set. A failed write to one recipient is logged and
//! skipped; it never aborts the rest of the fan-out.
//!
//! Stamping, snapshotting and enqueueing happen under one fan-out lock, so
//! every recipient sees events in stamp order. Writes are non-blocking queue
//! pushes; the socket write happens later in the connection's writer task.

use crate::connection::{Connection, ConnectionId, SessionRegistry};
use crate::events::{EventKind, MonotonicClock, OutboundEvent, RosterEntry};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sends events to all, all-but-one, or exactly one connection
///
/// Callers pass a builder that receives the server timestamp; the
/// broadcaster assigns it at send time.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
    clock: MonotonicClock,
    fanout: Arc<Mutex<()>>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry
    pub fn new(registry: Arc<SessionRegistry>, clock: MonotonicClock) -> Self {
        Self {
            registry,
            clock,
            fanout: Arc::new(Mutex::new(())),
        }
    }

    /// Send an event to every open connection, named or not
    pub fn send_to_all<F>(&self, build: F) -> usize
    where
        F: FnOnce(i64) -> Result<OutboundEvent, serde_json::Error>,
    {
        let _fanout = self.fanout.lock();
        let Some((kind, text)) = self.stamp(build) else {
            return 0;
        };

        let sent = Self::deliver(self.registry.connections().iter(), &text);

        tracing::debug!(kind = %kind, sent = sent, "Event broadcast to all connections");
        sent
    }

    /// Send an event to every open connection except `excluded`
    pub fn send_to_others<F>(&self, excluded: &ConnectionId, build: F) -> usize
    where
        F: FnOnce(i64) -> Result<OutboundEvent, serde_json::Error>,
    {
        let _fanout = self.fanout.lock();
        let Some((kind, text)) = self.stamp(build) else {
            return 0;
        };

        let connections = self.registry.connections();
        let sent = Self::deliver(
            connections.iter().filter(|conn| conn.id() != excluded),
            &text,
        );

        tracing::trace!(
            kind = %kind,
            excluded = %excluded,
            sent = sent,
            "Event broadcast to other connections"
        );
        sent
    }

    /// Send an event to a single connection
    ///
    /// Returns `false` when the target is unknown, not open, or the write failed.
    pub fn send_to_one<F>(&self, target: &ConnectionId, build: F) -> bool
    where
        F: FnOnce(i64) -> Result<OutboundEvent, serde_json::Error>,
    {
        let _fanout = self.fanout.lock();
        let Some(conn) = self.registry.connection(target) else {
            tracing::trace!(connection_id = %target, "Send target not registered");
            return false;
        };
        let Some((_, text)) = self.stamp(build) else {
            return false;
        };

        Self::deliver(std::iter::once(&conn), &text) == 1
    }

    /// Send the current roster to every open connection
    ///
    /// The roster is read under the fan-out lock, so a later roster never
    /// reaches a recipient ahead of an earlier one.
    pub fn broadcast_roster(&self) -> usize {
        let _fanout = self.fanout.lock();
        let roster: Vec<RosterEntry> = self
            .registry
            .list_identities()
            .into_iter()
            .map(RosterEntry::from)
            .collect();

        let Some((_, text)) = self.stamp(|at| OutboundEvent::users_list(&roster, at)) else {
            return 0;
        };
        let sent = Self::deliver(self.registry.connections().iter(), &text);

        tracing::debug!(users = roster.len(), sent = sent, "Roster broadcast");
        sent
    }

    /// Build and encode an event at the current server time
    ///
    /// Must be called with the fan-out lock held.
    fn stamp<F>(&self, build: F) -> Option<(EventKind, String)>
    where
        F: FnOnce(i64) -> Result<OutboundEvent, serde_json::Error>,
    {
        let event = match build(self.clock.now_millis()) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build event payload");
                return None;
            }
        };

        match event.to_json() {
            Ok(text) => Some((event.kind, text)),
            Err(e) => {
                tracing::error!(kind = %event.kind, error = %e, "Failed to serialize event");
                None
            }
        }
    }

    fn deliver<'a>(connections: impl Iterator<Item = &'a Arc<Connection>>, text: &str) -> usize {
        let mut sent = 0;

        for conn in connections {
            if !conn.is_open() {
                continue;
            }

            match conn.send(text.to_owned()) {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::trace!(
                        connection_id = %conn.id(),
                        error = %e,
                        "Delivery failed, skipping recipient"
                    );
                }
            }
        }

        sent
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
