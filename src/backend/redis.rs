//! Redis backend
//!
//! Opens a multiplexed async connection per logical store operation.
//! Password and database index travel in the connection URL so `AUTH` and
//! `SELECT` happen during the handshake.

use crate::backend::client::{escape_glob, Connector, KeyValueClient};
use crate::config::BackendConfig;
use crate::error::{CachetError, CachetResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Option key naming the prefix applied to every key
pub const PREFIX_OPTION: &str = "prefix";

/// Connector for a Redis server
pub struct RedisConnector {
    client: Client,
    address: String,
    prefix: String,
    connect_timeout: Duration,
}

impl RedisConnector {
    /// Build a connector from backend config; does not connect yet
    pub fn new(config: &BackendConfig) -> CachetResult<Self> {
        let url = connection_url(config)?;
        let client = Client::open(url.as_str()).map_err(|e| CachetError::Connection {
            backend: "redis",
            address: config.address(),
            reason: e.to_string(),
        })?;

        let mut prefix = String::new();
        for (key, value) in &config.options {
            match key.as_str() {
                PREFIX_OPTION => prefix = value.clone(),
                other => warn!("Ignoring unsupported redis option: {}", other),
            }
        }

        Ok(Self {
            client,
            address: config.address(),
            prefix,
            connect_timeout: config.connect_timeout(),
        })
    }
}

/// `redis://[:password@]host:port/database`
fn connection_url(config: &BackendConfig) -> CachetResult<Url> {
    let raw = format!("redis://{}:{}/{}", config.host, config.port, config.database);
    let mut url = Url::parse(&raw).map_err(|e| CachetError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;

    if let Some(ref password) = config.password {
        url.set_password(Some(password))
            .map_err(|()| CachetError::InvalidUrl {
                url: raw.clone(),
                reason: "cannot carry a password".to_string(),
            })?;
    }

    Ok(url)
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self) -> CachetResult<Box<dyn KeyValueClient>> {
        let connecting = self.client.get_multiplexed_async_connection();
        let conn = tokio::time::timeout(self.connect_timeout, connecting)
            .await
            .map_err(|_| CachetError::Connection {
                backend: "redis",
                address: self.address.clone(),
                reason: format!("timed out after {:?}", self.connect_timeout),
            })?
            .map_err(|e| CachetError::Connection {
                backend: "redis",
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        debug!("Connected to redis at {}", self.address);
        Ok(Box::new(RedisConnection {
            conn,
            prefix: self.prefix.clone(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

struct RedisConnection {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisConnection {
    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl KeyValueClient for RedisConnection {
    async fn get(&mut self, key: &str) -> CachetResult<Option<Vec<u8>>> {
        let key = self.prefixed(key);
        let value: Option<Vec<u8>> = self
            .conn
            .get(&key)
            .await
            .map_err(|e| CachetError::backend("GET", e))?;
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) -> CachetResult<()> {
        let key = self.prefixed(key);
        match ttl {
            Some(ttl) => {
                let _: () = self
                    .conn
                    .set_ex(&key, value, ttl.as_secs().max(1))
                    .await
                    .map_err(|e| CachetError::backend("SETEX", e))?;
            }
            None => {
                let _: () = self
                    .conn
                    .set(&key, value)
                    .await
                    .map_err(|e| CachetError::backend("SET", e))?;
            }
        }
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> CachetResult<u64> {
        let key = self.prefixed(key);
        let removed: u64 = self
            .conn
            .del(&key)
            .await
            .map_err(|e| CachetError::backend("DEL", e))?;
        Ok(removed)
    }

    async fn keys_matching(&mut self, pattern: &str) -> CachetResult<Vec<String>> {
        // The prefix is literal even if it contains glob metacharacters
        let pattern = format!("{}{}", escape_glob(self.key_prefix()), pattern);
        let keys: Vec<String> = self
            .conn
            .keys(&pattern)
            .await
            .map_err(|e| CachetError::backend("KEYS", e))?;
        Ok(keys)
    }

    async fn hash_set_if_absent(
        &mut self,
        hash: &str,
        field: &str,
        value: &str,
    ) -> CachetResult<bool> {
        let hash = self.prefixed(hash);
        let created: bool = self
            .conn
            .hset_nx(&hash, field, value)
            .await
            .map_err(|e| CachetError::backend("HSETNX", e))?;
        Ok(created)
    }

    async fn hash_get(&mut self, hash: &str, field: &str) -> CachetResult<Option<String>> {
        let hash = self.prefixed(hash);
        let value: Option<String> = self
            .conn
            .hget(&hash, field)
            .await
            .map_err(|e| CachetError::backend("HGET", e))?;
        Ok(value)
    }

    async fn hash_delete(&mut self, hash: &str, field: &str) -> CachetResult<u64> {
        let hash = self.prefixed(hash);
        let removed: u64 = self
            .conn
            .hdel(&hash, field)
            .await
            .map_err(|e| CachetError::backend("HDEL", e))?;
        Ok(removed)
    }

    async fn delete_hash(&mut self, hash: &str) -> CachetResult<()> {
        let hash = self.prefixed(hash);
        let _: u64 = self
            .conn
            .del(&hash)
            .await
            .map_err(|e| CachetError::backend("DEL", e))?;
        Ok(())
    }

    fn key_prefix(&self) -> &str {
        &self.prefix
    }
}
