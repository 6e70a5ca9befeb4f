//! # Node Configuration
//!
//! Production-grade configuration management with:
//!
//! - Environment variable support (12-factor app)
//! - Configuration file loading (YAML)
//! - Comprehensive validation
//! - Sensible defaults
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ARCADE_API_ADDR` | HTTP API address | `127.0.0.1:3001` |
//! | `ARCADE_WINDOW_SIZE` | Vote window size, in blocks | `5` |
//! | `ARCADE_ROM_URL` | ROM source URL | *required* |
//! | `ARCADE_SAVE_DIR` | Save directory | `./data` |
//! | `ARCADE_BLOCK_TIME_MS` | Expected block time | `2000` |
//! | `ARCADE_RELAY_ENABLED` | Enable the gasless vote relay | `false` |
//! | `ARCADE_RELAY_KEY` | Relay wallet private key (hex) | *required if relay enabled* |
//! | `ARCADE_RELAY_DELEGATION_ADDRESS` | EIP-7702 delegation contract | *required if relay enabled* |
//! | `ARCADE_LOG_LEVEL` | Log level | `info` |
//! | `ARCADE_LOG_FORMAT` | Log format (json/pretty) | `json` |
//! | `ARCADE_PRODUCTION` | Gate the startup barrier (§4.3) | `false` |
//! | `ARCADE_STARTUP_BARRIER_MS` | Startup barrier duration, production only | `5000` |

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse { key: String, message: String },

    /// File loading error.
    #[error("failed to load configuration file: {0}")]
    FileLoad(String),

    /// Validation error.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Main node configuration (§6 "Environment inputs", §4.7 startup order).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NodeConfig {
    /// HTTP/WebSocket API configuration.
    #[validate(nested)]
    #[serde(default)]
    pub api: ApiConfig,

    /// Chain client configuration.
    #[validate(nested)]
    #[serde(default)]
    pub chain: ChainConfig,

    /// Vote window configuration.
    #[validate(nested)]
    #[serde(default)]
    pub window: WindowConfig,

    /// Emulator/ROM configuration.
    #[validate(nested)]
    #[serde(default)]
    pub emulator: EmulatorConfig,

    /// Frame pipeline configuration.
    #[validate(nested)]
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Gasless vote relay configuration.
    #[validate(nested)]
    #[serde(default)]
    pub relay: RelaySettings,

    /// Metrics configuration.
    #[validate(nested)]
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Resilience configuration.
    #[validate(nested)]
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            chain: ChainConfig::default(),
            window: WindowConfig::default(),
            emulator: EmulatorConfig::default(),
            pipeline: PipelineConfig::default(),
            relay: RelaySettings::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
            resilience: ResilienceConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables layered on defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileLoad(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileLoad(e.to_string()))
    }

    /// Overlay whichever environment variables are explicitly set.
    pub fn merge_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(addr) = std::env::var("ARCADE_API_ADDR") {
            self.api.addr = addr.parse().map_err(|_| ConfigError::EnvParse {
                key: "ARCADE_API_ADDR".to_string(),
                message: "invalid socket address".to_string(),
            })?;
        }
        if let Ok(url) = std::env::var("ARCADE_ROM_URL") {
            self.emulator.rom_url = url;
        }
        if let Ok(dir) = std::env::var("ARCADE_SAVE_DIR") {
            self.emulator.save_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("ARCADE_WINDOW_SIZE") {
            self.window.window_size = size.parse().map_err(|_| ConfigError::EnvParse {
                key: "ARCADE_WINDOW_SIZE".to_string(),
                message: "invalid window size".to_string(),
            })?;
        }
        if let Ok(ms) = std::env::var("ARCADE_BLOCK_TIME_MS") {
            self.chain.block_time_ms = ms.parse().map_err(|_| ConfigError::EnvParse {
                key: "ARCADE_BLOCK_TIME_MS".to_string(),
                message: "invalid block time".to_string(),
            })?;
        }
        if let Ok(enabled) = std::env::var("ARCADE_RELAY_ENABLED") {
            self.relay.enabled = enabled.parse().unwrap_or(false);
        }
        if let Ok(key) = std::env::var("ARCADE_RELAY_KEY") {
            self.relay.private_key = Some(key);
        }
        if let Ok(addr) = std::env::var("ARCADE_RELAY_DELEGATION_ADDRESS") {
            self.relay.delegation_contract_address = addr;
        }
        if let Ok(level) = std::env::var("ARCADE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ARCADE_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(production) = std::env::var("ARCADE_PRODUCTION") {
            self.emulator.production = production.parse().unwrap_or(false);
        }
        if let Ok(ms) = std::env::var("ARCADE_STARTUP_BARRIER_MS") {
            self.emulator.startup_barrier_ms = ms.parse().map_err(|_| ConfigError::EnvParse {
                key: "ARCADE_STARTUP_BARRIER_MS".to_string(),
                message: "invalid startup barrier duration".to_string(),
            })?;
        }
        Ok(())
    }

    /// Validate the configuration, including cross-field invariants the
    /// `validator` derive can't express.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log level '{}'; valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log format '{}'; valid values: {:?}",
                self.logging.format, valid_formats
            )));
        }

        if self.relay.enabled {
            if self.relay.private_key.is_none() {
                return Err(ConfigError::Invalid(
                    "relay is enabled but ARCADE_RELAY_KEY was not set".to_string(),
                ));
            }
            if self.relay.delegation_contract_address.is_empty() {
                return Err(ConfigError::Invalid(
                    "relay is enabled but ARCADE_RELAY_DELEGATION_ADDRESS was not set".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// HTTP/WebSocket API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ApiConfig {
    /// Listen address for the HTTP + streaming server.
    pub addr: SocketAddr,

    /// Request timeout in seconds.
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u32,

    /// Maximum request body size in bytes.
    #[validate(range(min = 1024, max = 104_857_600))]
    pub max_body_size: usize,

    /// Enable CORS (spectators typically connect cross-origin).
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3001".parse().expect("valid default address"),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024,
            cors_enabled: true,
        }
    }
}

/// Chain client configuration (C1).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ChainConfig {
    /// WebSocket RPC endpoint for `eth_subscribe`.
    pub ws_url: String,

    /// HTTP RPC endpoint for polling fallback and log range queries.
    pub http_url: String,

    /// The vote contract address to filter `VoteCast` logs from.
    pub vote_contract_address: String,

    /// Expected block time, used to size the poll timer (T2).
    #[validate(range(min = 100, max = 60_000))]
    pub block_time_ms: u64,

    /// Reconnect delay after a dropped subscription.
    #[validate(range(min = 1, max = 300))]
    pub reconnect_delay_secs: u64,

    /// How long a `seenEvents` entry is retained before the dedup-GC timer
    /// (T6) evicts it.
    #[validate(range(min = 60, max = 86_400))]
    pub dedup_retention_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8546".to_string(),
            http_url: "http://localhost:8545".to_string(),
            vote_contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            block_time_ms: 2000,
            reconnect_delay_secs: 5,
            dedup_retention_secs: 3600,
        }
    }
}

/// Vote window configuration (C2).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct WindowConfig {
    /// Number of blocks per voting window.
    #[validate(range(min = 1, max = 10_000))]
    pub window_size: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { window_size: 5 }
    }
}

/// Emulator/ROM configuration (C3).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EmulatorConfig {
    /// Where to download the ROM from on startup.
    pub rom_url: String,

    /// Directory holding `pokemon-red.sav` / `pokemon-red.state`.
    pub save_dir: PathBuf,

    /// Auto-save interval (T5).
    #[validate(range(min = 1, max = 3600))]
    pub auto_save_interval_secs: u64,

    /// Game-state sampler interval (T4).
    #[validate(range(min = 1, max = 60_000))]
    pub game_state_interval_ms: u64,

    /// Whether this is a production deployment. Gates the startup
    /// barrier below (§4.3): disabled by default so local runs and
    /// tests don't pay the delay.
    pub production: bool,

    /// How long to wait before emulator init in production, so a
    /// previously running process has time to flush its save (§4.3,
    /// §4.7).
    #[validate(range(min = 0, max = 60_000))]
    pub startup_barrier_ms: u64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            rom_url: String::new(),
            save_dir: PathBuf::from("./data"),
            auto_save_interval_secs: 30,
            game_state_interval_ms: 1000,
            production: false,
            startup_barrier_ms: 5000,
        }
    }
}

/// Frame pipeline configuration (C4).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PipelineConfig {
    /// Max in-flight compressions (§5: bounded by a semaphore of size 8).
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent: usize,

    /// JPEG quality preset (§9: fixed, not adaptive).
    #[validate(range(min = 1, max = 100))]
    pub quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            quality: arcade_pipeline::DEFAULT_QUALITY,
        }
    }
}

/// Gasless vote relay configuration (C6).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RelaySettings {
    /// Whether the relay is enabled at all.
    pub enabled: bool,

    /// Relay wallet private key (hex encoded). Required when `enabled`.
    pub private_key: Option<String>,

    /// EIP-7702 delegation contract address. Required when `enabled`.
    pub delegation_contract_address: String,

    /// Chain id echoed into the authorization list.
    pub chain_id: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            private_key: None,
            delegation_contract_address: String::new(),
            chain_id: 1,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct MetricsConfig {
    /// Whether the `/metrics` endpoint is mounted.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (json, pretty).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Resilience configuration shared by every upstream-facing component.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct ResilienceConfig {
    /// Retry configuration.
    #[validate(nested)]
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit breaker configuration.
    #[validate(nested)]
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetryConfig {
    /// Maximum retry attempts.
    #[validate(range(min = 0, max = 10))]
    pub max_attempts: u32,

    /// Initial delay in milliseconds.
    #[validate(range(min = 10, max = 60_000))]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds.
    #[validate(range(min = 100, max = 300_000))]
    pub max_delay_ms: u64,

    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Convert to the shared [`arcade_types::resilience::RetryPolicy`].
    pub fn to_policy(&self) -> arcade_types::resilience::RetryPolicy {
        arcade_types::resilience::RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            jitter: true,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening.
    #[validate(range(min = 1, max = 100))]
    pub failure_threshold: u32,

    /// Number of successes to close from half-open.
    #[validate(range(min = 1, max = 100))]
    pub success_threshold: u32,

    /// Timeout in seconds before transitioning to half-open.
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout_secs: 30,
        }
    }
}

impl CircuitBreakerConfig {
    /// Convert to an [`arcade_types::resilience::CircuitBreaker`].
    pub fn to_circuit_breaker(&self) -> arcade_types::resilience::CircuitBreaker {
        arcade_types::resilience::CircuitBreaker::new(
            self.failure_threshold,
            self.success_threshold,
            Duration::from_secs(self.timeout_secs as u64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn relay_enabled_without_key_is_rejected() {
        let mut config = NodeConfig::default();
        config.relay.enabled = true;
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn log_level_is_validated() {
        let mut config = NodeConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate_config().is_err());
    }
}
