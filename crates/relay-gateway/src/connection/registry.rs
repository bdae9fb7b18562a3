//! Session registry
//!
//! Tracks every live connection and the display name it holds.
//!
//! All state sits behind one mutex so that name claims are an atomic
//! check-and-set: two connections racing for the same name cannot both win.
//! Every operation is in-memory and never awaits, so the lock is never held
//! across I/O.

use super::{Connection, ConnectionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A named connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

/// Name claim failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name is empty")]
    InvalidName,

    #[error("name is held by another connection")]
    NameTaken,

    #[error("connection is not registered")]
    UnknownConnection,
}

/// What `take` removed from the registry
#[derive(Debug)]
pub struct Departure {
    pub connection: Arc<Connection>,
    /// The identity the connection held, if it had claimed a name
    pub identity: Option<Identity>,
}

#[derive(Default)]
struct RegistryState {
    /// Live connection set
    connections: HashMap<ConnectionId, Arc<Connection>>,
    /// Connection ID to display name
    names_by_id: HashMap<ConnectionId, String>,
    /// Case-folded display name to holder
    holders: HashMap<String, ConnectionId>,
    /// Named connections in order of their first successful claim
    roster: Vec<ConnectionId>,
}

impl RegistryState {
    fn identity(&self, id: &ConnectionId) -> Option<Identity> {
        self.names_by_id.get(id).map(|name| Identity {
            connection_id: id.clone(),
            display_name: name.clone(),
        })
    }
}

/// Registry of live connections and their identities
#[derive(Default)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
}

/// Normalize a name for uniqueness comparison
fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add an unnamed connection
    ///
    /// Returns `false` (and changes nothing) if the ID is already registered.
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        let mut state = self.state.lock();
        if state.connections.contains_key(connection.id()) {
            return false;
        }

        tracing::debug!(connection_id = %connection.id(), "Connection registered");
        state.connections.insert(connection.id().clone(), connection);
        true
    }

    /// Remove a connection and release its identity
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        self.take(id).is_some()
    }

    /// Remove a connection, returning the handle and the identity it held
    ///
    /// Removal and name release happen under the same lock acquisition.
    pub fn take(&self, id: &ConnectionId) -> Option<Departure> {
        let mut state = self.state.lock();
        let connection = state.connections.remove(id)?;

        let identity = state.names_by_id.remove(id).map(|display_name| {
            state.holders.remove(&fold_name(&display_name));
            state.roster.retain(|held| held != id);
            Identity {
                connection_id: id.clone(),
                display_name,
            }
        });

        tracing::debug!(
            connection_id = %id,
            named = identity.is_some(),
            "Connection unregistered"
        );

        Some(Departure {
            connection,
            identity,
        })
    }

    /// Bind a display name to a connection
    ///
    /// The name is trimmed before it is compared or stored. Comparison is
    /// case-insensitive. Claiming the name a connection already holds (in any
    /// case) succeeds and updates its spelling.
    pub fn claim_name(&self, id: &ConnectionId, name: &str) -> Result<Identity, NameError> {
        let display_name = name.trim();
        if display_name.is_empty() {
            return Err(NameError::InvalidName);
        }
        let key = fold_name(display_name);

        let mut state = self.state.lock();
        if !state.connections.contains_key(id) {
            return Err(NameError::UnknownConnection);
        }
        if state.holders.get(&key).is_some_and(|holder| holder != id) {
            return Err(NameError::NameTaken);
        }

        match state.names_by_id.get(id).map(|previous| fold_name(previous)) {
            Some(previous_key) if previous_key != key => {
                state.holders.remove(&previous_key);
            }
            Some(_) => {}
            None => state.roster.push(id.clone()),
        }

        state.holders.insert(key, id.clone());
        state
            .names_by_id
            .insert(id.clone(), display_name.to_string());

        Ok(Identity {
            connection_id: id.clone(),
            display_name: display_name.to_string(),
        })
    }

    /// Look up the identity of a connection
    pub fn identity_of(&self, id: &ConnectionId) -> Option<Identity> {
        self.state.lock().identity(id)
    }

    /// Snapshot of all named connections in claim order
    pub fn list_identities(&self) -> Vec<Identity> {
        let state = self.state.lock();
        state
            .roster
            .iter()
            .filter_map(|id| state.identity(id))
            .collect()
    }

    /// Get a connection handle by ID
    pub fn connection(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.state.lock().connections.get(id).cloned()
    }

    /// Snapshot of the live connection set
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.state.lock().connections.values().cloned().collect()
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.state.lock().connections.contains_key(id)
    }

    /// Number of tracked connections, named or not
    pub fn count(&self) -> usize {
        self.state.lock().connections.len()
    }

    /// Number of connections holding a name
    pub fn named_count(&self) -> usize {
        self.state.lock().names_by_id.len()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SessionRegistry")
            .field("connections", &state.connections.len())
            .field("named", &state.names_by_id.len())
            .finish()
    }
}
