//! Event broadcasting
//!
//! Fans serialized events out to registered connections.

mod broadcaster;

pub use broadcaster::Broadcaster;
