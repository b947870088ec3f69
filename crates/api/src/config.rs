//! Server Configuration
//!
//! Layered from built-in defaults, an optional TOML file and `RENTAL__*`
//! environment variables, in that order.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use inference_engine::ArtifactConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file, without extension
pub const DEFAULT_CONFIG_FILE: &str = "rental-price";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RENTAL";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LogConfig,
    pub artifacts: ArtifactConfig,
    /// Listings CSV; the listing routes serve an empty set when unset
    pub listings: Option<PathBuf>,
    pub rate_limit: RateLimitConfig,
    pub validation: ValidationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LogConfig::default(),
            artifacts: ArtifactConfig::default(),
            listings: None,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration, reading `file` (any format the config crate
    /// knows, extension optional) when it exists.
    pub fn load(file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
