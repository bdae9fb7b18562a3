//! Handler error types

use crate::connection::NameError;
use crate::events::{ErrorEvent, OutboundEvent};
use thiserror::Error;

/// Handler error type
///
/// The `Display` text is exactly what the client sees in `error.message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Envelope could not be decoded
    #[error("invalid message format")]
    InvalidEnvelope(String),

    /// Empty or missing name
    #[error("invalid name provided")]
    InvalidName,

    /// Name is held by another connection
    #[error("name already taken")]
    NameTaken,

    /// Chat before a name was claimed
    #[error("please set your name first")]
    NotNamed,

    /// Empty or missing chat text
    #[error("invalid message")]
    InvalidMessage,

    /// Unrecognized `type`
    #[error("unknown message type")]
    UnknownMessageType(String),

    /// Connection vanished mid-request
    #[error("connection not found")]
    ConnectionNotFound,
}

impl HandlerError {
    /// Extra detail for the client, if any
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::InvalidEnvelope(details) | Self::UnknownMessageType(details) => Some(details),
            _ => None,
        }
    }

    /// Build the `error` event sent back to the offending connection
    pub fn to_event(&self, at: i64) -> Result<OutboundEvent, serde_json::Error> {
        let payload = match self.details() {
            Some(details) => ErrorEvent::new(self.to_string()).with_details(details),
            None => ErrorEvent::new(self.to_string()),
        };
        OutboundEvent::error(&payload, at)
    }
}

impl From<NameError> for HandlerError {
    fn from(err: NameError) -> Self {
        match err {
            NameError::InvalidName => Self::InvalidName,
            NameError::NameTaken => Self::NameTaken,
            NameError::UnknownConnection => Self::ConnectionNotFound,
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
