//! Backend factory
//!
//! Picks the key-value implementation named by `backend.kind`.

use crate::backend::client::Connector;
use crate::backend::memory::MemoryConnector;
use crate::config::{BackendConfig, BackendKind};
use crate::error::CachetResult;
use std::sync::Arc;
use tracing::debug;

/// Create the connector configured by `config`
///
/// # Returns
/// * `Ok(Arc<dyn Connector>)` - A shared connector; it does not connect yet
/// * `Err` - If the backend is compiled out or its settings are unusable
pub fn create_connector(config: &BackendConfig) -> CachetResult<Arc<dyn Connector>> {
    debug!("Creating {:?} backend for {}", config.kind, config.address());

    match config.kind {
        BackendKind::Memory => {
            let prefix = config.options.get("prefix").cloned().unwrap_or_default();
            Ok(Arc::new(MemoryConnector::with_prefix(prefix)))
        }
        BackendKind::Redis => redis_connector(config),
    }
}

#[cfg(feature = "redis")]
fn redis_connector(config: &BackendConfig) -> CachetResult<Arc<dyn Connector>> {
    let connector = crate::backend::redis::RedisConnector::new(config)?;
    Ok(Arc::new(connector))
}

#[cfg(not(feature = "redis"))]
fn redis_connector(_config: &BackendConfig) -> CachetResult<Arc<dyn Connector>> {
    Err(crate::error::CachetError::BackendUnavailable(
        "redis".to_string(),
    ))
}
