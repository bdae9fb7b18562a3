//! # relay-gateway
//!
//! Real-time WebSocket chat relay: a session registry of named connections,
//! a message dispatcher, and fan-out of chat, roster and typing events.

pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use connection::ConnectionLifecycle;
pub use server::{create_app, run, serve_with_shutdown, GatewayState};
