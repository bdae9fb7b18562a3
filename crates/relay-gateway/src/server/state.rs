//! Gateway state
//!
//! Application state for the relay server.

use crate::connection::ConnectionLifecycle;
use relay_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the relay server.
#[derive(Clone)]
pub struct GatewayState {
    /// Relay core: registry, broadcaster and dispatcher
    lifecycle: ConnectionLifecycle,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state with an empty relay
    pub fn new(config: AppConfig) -> Self {
        Self {
            lifecycle: ConnectionLifecycle::new(config.websocket.max_connections),
            config: Arc::new(config),
        }
    }

    /// Get the connection lifecycle
    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("lifecycle", &self.lifecycle)
            .field("config", &"AppConfig")
            .finish()
    }
}
