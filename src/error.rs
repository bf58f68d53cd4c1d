//! Error types for Cachet
//!
//! All modules use `CachetResult<T>` as their return type. Read-path misses
//! are not errors: they surface as `Ok(None)` or an empty entry list.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Cachet operations
pub type CachetResult<T> = Result<T, CachetError>;

/// All errors that can occur in Cachet
#[derive(Error, Debug)]
pub enum CachetError {
    // Store errors
    #[error("Unable to store {key}: {reason}")]
    StorageWrite { key: String, reason: String },

    // Backend errors
    #[error("Cannot connect to {backend} at {address}: {reason}")]
    Connection {
        backend: &'static str,
        address: String,
        reason: String,
    },

    #[error("Backend {operation} failed: {reason}")]
    Backend {
        operation: &'static str,
        reason: String,
    },

    #[error("Backend '{0}' is not compiled into this build")]
    BackendUnavailable(String),

    // Request errors
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CachetError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a backend command error
    pub fn backend(operation: &'static str, reason: impl ToString) -> Self {
        Self::Backend {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Create a storage write error for `key`
    pub fn storage_write(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StorageWrite {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// The store itself never retries; this is advice for the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Backend { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Connection { .. } => {
                Some("Check [backend] host, port and password in the config file")
            }
            Self::BackendUnavailable(_) => {
                Some("Rebuild with the matching cargo feature, or set backend.kind = \"memory\"")
            }
            Self::ConfigInvalid { .. } => Some("Run: cachet config init --force"),
            _ => None,
        }
    }
}
