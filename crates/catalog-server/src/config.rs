//! Configuration loading

use anyhow::{Context, Result};
use catalog_core::{CacheTtls, DEFAULT_SWEEP_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Read cache configuration
///
/// TTLs are per read path. A TTL of 0 disables caching for that path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_published_ttl_secs")]
    pub published_ttl_secs: u64,
    #[serde(default = "default_detail_ttl_secs")]
    pub detail_ttl_secs: u64,
    #[serde(default = "default_artists_ttl_secs")]
    pub artists_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_secs: default_sweep_interval_secs(),
            published_ttl_secs: default_published_ttl_secs(),
            detail_ttl_secs: default_detail_ttl_secs(),
            artists_ttl_secs: default_artists_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// TTLs for the catalog service; all zero when the cache is disabled
    pub fn ttls(&self) -> CacheTtls {
        if !self.enabled {
            return CacheTtls::disabled();
        }
        CacheTtls {
            published: Duration::from_secs(self.published_ttl_secs),
            detail: Duration::from_secs(self.detail_ttl_secs),
            artists: Duration::from_secs(self.artists_ttl_secs),
        }
    }

    /// Sweep period, falling back to the default for a zero interval
    pub fn sweep_interval(&self) -> Duration {
        if self.sweep_interval_secs == 0 {
            warn!(
                "sweep_interval_secs must be positive, using {} seconds",
                DEFAULT_SWEEP_INTERVAL.as_secs()
            );
            return DEFAULT_SWEEP_INTERVAL;
        }
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/catalog.db".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_published_ttl_secs() -> u64 {
    600
}

fn default_detail_ttl_secs() -> u64 {
    300
}

fn default_artists_ttl_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }
}
