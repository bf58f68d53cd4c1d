//! Configuration schema for Cachet
//!
//! Configuration is stored at `~/.config/cachet/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Key-value backend connection settings
    pub backend: BackendConfig,

    /// Cache store key layout and expiry
    pub store: StoreConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Which key-value implementation backs the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Redis,
    Memory,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend implementation
    pub kind: BackendKind,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Password sent on connect (optional)
    pub password: Option<String>,

    /// Numeric database index selected on connect
    pub database: i64,

    /// Backend-specific options. `prefix` is applied to every key.
    pub options: HashMap<String, String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Redis,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            database: 0,
            options: HashMap::new(),
            connect_timeout_secs: 5,
        }
    }
}

impl BackendConfig {
    /// `host:port` for display and error messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix of keys holding variant lists
    pub metadata_prefix: String,

    /// Prefix of keys holding response bodies
    pub digest_prefix: String,

    /// Hash holding the stampede locks
    pub lock_key: String,

    /// Expiry applied to bodies and variant lists on write (0 = disabled)
    pub ttl_secs: u64,

    /// Suffix body keys with a SHA256 of the body so variants of one URL
    /// keep separate bodies
    pub content_addressed_bodies: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            metadata_prefix: "MetaData".to_string(),
            digest_prefix: "DigestKey".to_string(),
            lock_key: "Lock".to_string(),
            ttl_secs: 120,
            content_addressed_bodies: false,
        }
    }
}

impl StoreConfig {
    /// Configured TTL, `None` when disabled
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[backend]"));
        assert!(toml.contains("[store]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.backend.kind, BackendKind::Redis);
        assert_eq!(config.backend.port, 6379);
        assert_eq!(config.store.metadata_prefix, "MetaData");
        assert_eq!(config.store.digest_prefix, "DigestKey");
        assert_eq!(config.store.lock_key, "Lock");
        assert_eq!(config.store.ttl(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [backend]
            kind = "memory"
            database = 3

            [backend.options]
            prefix = "app:"

            [store]
            ttl_secs = 0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.backend.database, 3);
        assert_eq!(config.backend.options.get("prefix").map(String::as_str), Some("app:"));
        assert_eq!(config.backend.host, "localhost"); // default preserved
        assert_eq!(config.store.ttl(), None);
    }
}
