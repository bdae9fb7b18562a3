//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Listening socket configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route the WebSocket upgrade is served on
    pub ws_path: String,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// WebSocket connection policy
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Soft limit on concurrently open connections
    pub max_connections: usize,
    /// Interval between server pings
    pub heartbeat_interval_ms: u64,
    /// Silence after which a connection is force-disconnected
    pub heartbeat_timeout_ms: u64,
    /// Largest inbound frame accepted
    pub max_message_bytes: usize,
    /// Per-connection outbound queue capacity
    pub outbound_buffer: usize,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

// Default value functions
fn default_app_name() -> String {
    "chat-relay".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_max_connections() -> usize {
    1000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_max_message_bytes() -> usize {
    1024 * 1024
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable holds an unparsable value or the
    /// resulting configuration is inconsistent
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let heartbeat_interval_ms =
            parse_or(&lookup, "HEARTBEAT_INTERVAL_MS", default_heartbeat_interval_ms())?;

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: match lookup("APP_ENV") {
                    Some(value) => Environment::parse(&value)
                        .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
                    None => Environment::default(),
                },
            },
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(default_host),
                port: parse_or(&lookup, "PORT", default_port())?,
                ws_path: lookup("WS_PATH").unwrap_or_else(default_ws_path),
            },
            websocket: WebSocketConfig {
                max_connections: parse_or(&lookup, "MAX_CONNECTIONS", default_max_connections())?,
                heartbeat_interval_ms,
                heartbeat_timeout_ms: parse_or(
                    &lookup,
                    "HEARTBEAT_TIMEOUT_MS",
                    heartbeat_interval_ms.saturating_mul(2),
                )?,
                max_message_bytes: parse_or(
                    &lookup,
                    "MAX_MESSAGE_BYTES",
                    default_max_message_bytes(),
                )?,
                outbound_buffer: parse_or(&lookup, "OUTBOUND_BUFFER", default_outbound_buffer())?,
            },
            cors: CorsConfig {
                enabled: lookup("CORS_ENABLED").is_some_and(|s| s.eq_ignore_ascii_case("true")),
                allowed_origins: lookup("ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_else(default_allowed_origins),
            },
            logging: LoggingConfig {
                level: lookup("LOG_LEVEL").unwrap_or_else(default_log_level),
                format: match lookup("LOG_FORMAT") {
                    Some(value) => match value.to_lowercase().as_str() {
                        "json" => LogFormat::Json,
                        "pretty" | "text" => LogFormat::Pretty,
                        _ => return Err(ConfigError::InvalidValue("LOG_FORMAT", value)),
                    },
                    None => LogFormat::default(),
                },
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("PORT", "0".to_string()));
        }
        if !self.server.ws_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "WS_PATH",
                self.server.ws_path.clone(),
            ));
        }
        if self.websocket.max_connections == 0 {
            return Err(ConfigError::InvalidValue("MAX_CONNECTIONS", "0".to_string()));
        }
        if self.websocket.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "HEARTBEAT_INTERVAL_MS",
                "0".to_string(),
            ));
        }
        if self.websocket.heartbeat_timeout_ms <= self.websocket.heartbeat_interval_ms {
            return Err(ConfigError::InvalidValue(
                "HEARTBEAT_TIMEOUT_MS",
                format!(
                    "{} (must exceed HEARTBEAT_INTERVAL_MS={})",
                    self.websocket.heartbeat_timeout_ms, self.websocket.heartbeat_interval_ms
                ),
            ));
        }
        if self.websocket.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue("OUTBOUND_BUFFER", "0".to_string()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
