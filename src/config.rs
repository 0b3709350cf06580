//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::websocket::PublisherConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Live feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
}

fn default_tick_interval() -> u64 {
    5
}

fn default_recent_limit() -> usize {
    10
}

fn default_send_timeout() -> u64 {
    3000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            recent_limit: default_recent_limit(),
            send_timeout_ms: default_send_timeout(),
        }
    }
}

impl HubConfig {
    /// Publisher settings; a zero interval is raised to one second
    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            tick_interval: Duration::from_secs(self.tick_interval_secs.max(1)),
            recent_limit: self.recent_limit,
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}

/// Sample data seeded at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,

    #[serde(default = "default_seed_count")]
    pub count: usize,
}

fn default_seed_enabled() -> bool {
    true
}

fn default_seed_count() -> usize {
    100
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_seed_enabled(),
            count: default_seed_count(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "subpulse=info,tower_http=debug".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether JSON log lines were requested
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("subpulse").join("config.toml")),
            Some(PathBuf::from("/etc/subpulse/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides looked up by variable name
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = lookup("SUBPULSE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SUBPULSE_PORT").and_then(|s| s.parse().ok()) {
            self.server.port = port;
        }

        // Hub overrides
        if let Some(secs) = lookup("SUBPULSE_TICK_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
            self.hub.tick_interval_secs = secs;
        }
        if let Some(limit) = lookup("SUBPULSE_RECENT_LIMIT").and_then(|s| s.parse().ok()) {
            self.hub.recent_limit = limit;
        }
        if let Some(ms) = lookup("SUBPULSE_SEND_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.hub.send_timeout_ms = ms;
        }

        // Seed overrides
        if let Some(count) = lookup("SUBPULSE_SEED_COUNT").and_then(|s| s.parse().ok()) {
            self.seed.count = count;
        }

        // Logging overrides
        if let Some(level) = lookup("SUBPULSE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SUBPULSE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# SubPulse Configuration
#
# Environment variables override these settings:
# - SUBPULSE_HOST
# - SUBPULSE_PORT
# - SUBPULSE_TICK_INTERVAL_SECS
# - SUBPULSE_RECENT_LIMIT
# - SUBPULSE_SEND_TIMEOUT_MS
# - SUBPULSE_SEED_COUNT
# - SUBPULSE_LOG_LEVEL
# - SUBPULSE_LOG_FORMAT

[server]
# HTTP server host
host = "0.0.0.0"

# HTTP server port
port = 8080

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[hub]
# Seconds between analytics broadcasts
tick_interval_secs = 5

# Number of recent subscriptions included in each broadcast
recent_limit = 10

# Give up on a single dashboard send after this many milliseconds
send_timeout_ms = 3000

[seed]
# Generate sample subscriptions at startup
enabled = true

# Number of sample subscriptions
count = 100

[logging]
# Log filter: trace, debug, info, warn, error, or a full filter directive
level = "subpulse=info,tower_http=debug"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
