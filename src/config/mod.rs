//! Loading and saving the Cachet config file

pub mod schema;

pub use schema::{BackendConfig, BackendKind, Config, GeneralConfig, StoreConfig};

use crate::error::{CachetError, CachetResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes one TOML config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user config file
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Manager for an explicit file, as given by `--config`
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/cachet/config.toml`, or `./cachet/config.toml` without a config dir
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cachet")
            .join("config.toml")
    }

    /// Parse the file; a missing file yields `Config::default()`
    pub async fn load(&self) -> CachetResult<Config> {
        if !self.config_path.exists() {
            debug!("No config at {}, using defaults", self.config_path.display());
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Parse `path`, reporting bad TOML as `ConfigInvalid`
    pub async fn load_from_file(&self, path: &Path) -> CachetResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CachetError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CachetError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write `config` as pretty TOML, creating parent directories
    pub async fn save(&self, config: &Config) -> CachetResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CachetError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Create the directory holding the file
    async fn ensure_config_dir(&self) -> CachetResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CachetError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// File this manager reads and writes
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
