//! WebSocket close codes
//!
//! Codes the relay uses when it closes a connection itself.

/// Relay WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure
    Normal = 1000,
    /// Server is shutting down
    GoingAway = 1001,
    /// Frame exceeded the configured size limit
    MessageTooBig = 1009,
    /// No traffic from the client within the heartbeat timeout
    HeartbeatTimeout = 4000,
    /// Connection limit reached
    ServerFull = 4001,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Normal closure",
            Self::GoingAway => "Server shutting down",
            Self::MessageTooBig => "Message too big",
            Self::HeartbeatTimeout => "Heartbeat timeout",
            Self::ServerFull => "Server full",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
