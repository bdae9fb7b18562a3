//! Individual relay connection
//!
//! A connection is an identifier plus an outbound handle into whatever
//! transport carries it. The relay never touches the socket directly.

use crate::protocol::CloseCode;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Server-generated connection identifier
///
/// Unique for the lifetime of the process; never reused for a second channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a new connection ID
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handle created, not yet registered
    Accepting,
    /// Registered and eligible for delivery
    Open,
    /// Close sequence in progress
    Closing,
    /// Terminal
    Closed,
}

/// Why a write to a recipient did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("channel closed")]
    Closed,
    #[error("outbound queue full")]
    Full,
}

impl<T> From<mpsc::error::TrySendError<T>> for DeliveryError {
    fn from(err: mpsc::error::TrySendError<T>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::Full,
            mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Outbound half of a transport channel
///
/// Implementations must not block: `send_text` hands the frame off (or fails)
/// immediately so a slow peer never stalls a fan-out.
pub trait OutboundChannel: Send + Sync {
    /// Queue a serialized envelope for the peer
    fn send_text(&self, text: String) -> Result<(), DeliveryError>;

    /// Whether the peer can still receive frames
    fn is_open(&self) -> bool;

    /// Ask the transport to close the channel
    fn close(&self, code: CloseCode);
}

/// Plain queue transport; the receiving half decides what to do with frames.
impl OutboundChannel for mpsc::Sender<String> {
    fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        self.try_send(text).map_err(DeliveryError::from)
    }

    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn close(&self, _code: CloseCode) {}
}

/// A single relay connection
pub struct Connection {
    /// Unique connection ID
    id: ConnectionId,

    /// Transport handle for outgoing frames
    outbound: Box<dyn OutboundChannel>,

    /// Current lifecycle state
    state: RwLock<ConnectionState>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection in the `Accepting` state
    pub fn new(id: ConnectionId, outbound: impl OutboundChannel + 'static) -> Arc<Self> {
        Arc::new(Self {
            id,
            outbound: Box::new(outbound),
            state: RwLock::new(ConnectionState::Accepting),
            created_at: Instant::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Move from `Accepting` to `Open`
    pub(crate) fn mark_open(&self) {
        let mut state = self.state.write();
        if *state == ConnectionState::Accepting {
            *state = ConnectionState::Open;
        }
    }

    /// Move into `Closing`; returns `false` if a close already started
    pub(crate) fn begin_close(&self) -> bool {
        let mut state = self.state.write();
        match *state {
            ConnectionState::Accepting | ConnectionState::Open => {
                *state = ConnectionState::Closing;
                true
            }
            ConnectionState::Closing | ConnectionState::Closed => false,
        }
    }

    pub(crate) fn mark_closed(&self) {
        *self.state.write() = ConnectionState::Closed;
    }

    /// Whether frames can currently be delivered
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open && self.outbound.is_open()
    }

    /// Send a serialized envelope to this connection
    pub fn send(&self, text: String) -> Result<(), DeliveryError> {
        if !self.is_open() {
            return Err(DeliveryError::Closed);
        }
        self.outbound.send_text(text)
    }

    /// Ask the transport to close the underlying channel
    pub fn close_transport(&self, code: CloseCode) {
        self.outbound.close(code);
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish()
    }
}
