//! Configuration Module
//!
//! This module defines all configuration structures for the batch writer.
//! Configuration is loaded from TOML files and parsed using serde.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Main configuration structure
///
/// Contains all configuration sections for the batch writer.
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [database]
/// url = "sqlite://batch-writer.db"
///
/// [transport]
/// host = "127.0.0.1"
/// port = 8080
///
/// [ipfs]
/// url = "http://127.0.0.1:5001"
///
/// [batch]
/// create_next_batch_interval_secs = 30
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub transport: TransportConfig,
    pub ipfs: IpfsConfig,
    pub batch: BatchConfig,
}

/// Claim store configuration
///
/// # Fields
/// - `url`: Database connection URL (e.g., "sqlite://batch-writer.db" or "sqlite::memory:")
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Event transport configuration
///
/// The transport accepts inbound events over HTTP and optionally forwards
/// outbound events to a downstream endpoint.
///
/// # Fields
/// - `host`: IP address the ingress binds to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port the ingress listens on
/// - `forward_url`: Base URL outbound events are POSTed to; `None` keeps them in-process
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub forward_url: Option<String>,
}

/// Directory service configuration
///
/// # Fields
/// - `url`: Base URL of the IPFS HTTP API (e.g., "http://127.0.0.1:5001")
#[derive(Debug, Clone, Deserialize)]
pub struct IpfsConfig {
    pub url: String,
}

/// Batch creation configuration
///
/// # Fields
/// - `create_next_batch_interval_secs`: Period of the batch scheduler, in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub create_next_batch_interval_secs: u64,
}

impl BatchConfig {
    /// Scheduler period as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.create_next_batch_interval_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read, the TOML is invalid, or a value is out of range
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;

        // A zero period would make the scheduler spin.
        if config.batch.create_next_batch_interval_secs == 0 {
            anyhow::bail!("batch.create_next_batch_interval_secs must be greater than zero");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [database]
        url = "sqlite::memory:"

        [transport]
        host = "0.0.0.0"
        port = 8080
        forward_url = "http://anchor:9090"

        [ipfs]
        url = "http://ipfs:5001"

        [batch]
        create_next_batch_interval_secs = 15
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.transport.port, 8080);
        assert_eq!(config.transport.forward_url.as_deref(), Some("http://anchor:9090"));
        assert_eq!(config.ipfs.url, "http://ipfs:5001");
        assert_eq!(config.batch.interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_forward_url_is_optional() {
        let content = FULL.replace("forward_url = \"http://anchor:9090\"", "");
        let config = Config::parse(&content).unwrap();
        assert!(config.transport.forward_url.is_none());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let content = FULL.replace(
            "create_next_batch_interval_secs = 15",
            "create_next_batch_interval_secs = 0",
        );
        assert!(Config::parse(&content).is_err());
    }

    #[test]
    fn test_missing_section_is_rejected() {
        assert!(Config::parse("[database]\nurl = \"sqlite::memory:\"\n").is_err());
    }
}
