//! Relay wire protocol
//!
//! Defines the inbound envelope, message types, payloads, and close codes.

mod close_codes;
mod message_types;
mod messages;
mod payloads;

pub use close_codes::CloseCode;
pub use message_types::InboundType;
pub use messages::ClientEnvelope;
pub use payloads::{ChatMessagePayload, SetNamePayload, TypingPayload};
