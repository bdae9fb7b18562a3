//! Integration test utilities for the chat relay
//!
//! This crate provides helpers for running end-to-end tests against
//! the WebSocket relay and its HTTP endpoints.

pub mod helpers;

pub use helpers::*;
