//! Relay events
//!
//! Defines all events the relay sends to clients.

mod clock;
mod event_types;
mod outbound;
mod payloads;

pub use clock::MonotonicClock;
pub use event_types::EventKind;
pub use outbound::OutboundEvent;
pub use payloads::{ChatMessageEvent, ErrorEvent, NameSetEvent, RosterEntry, UserTypingEvent};
