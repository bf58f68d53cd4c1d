//! Key-value backend abstraction
//!
//! The store only ever talks to these two traits. A `Connector` hands out a
//! fresh connection per logical store operation; the connection is released
//! when the boxed client is dropped, on success and error paths alike.

use crate::error::CachetResult;
use async_trait::async_trait;
use std::time::Duration;

/// Operations the cache store needs from a backing key-value store
///
/// Each call is expected to be atomic for the single key it touches.
/// Nothing stronger is assumed.
#[async_trait]
pub trait KeyValueClient: Send {
    /// Read a scalar value
    async fn get(&mut self, key: &str) -> CachetResult<Option<Vec<u8>>>;

    /// Write a scalar value, expiring after `ttl` when given
    async fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) -> CachetResult<()>;

    /// Delete a scalar key, returning how many keys were removed
    async fn delete(&mut self, key: &str) -> CachetResult<u64>;

    /// Enumerate keys matching a glob pattern
    ///
    /// Returned names include `key_prefix()`.
    async fn keys_matching(&mut self, pattern: &str) -> CachetResult<Vec<String>>;

    /// Set `field` in hash `hash` only if absent; true if newly set
    async fn hash_set_if_absent(&mut self, hash: &str, field: &str, value: &str)
        -> CachetResult<bool>;

    /// Read one field of a hash
    async fn hash_get(&mut self, hash: &str, field: &str) -> CachetResult<Option<String>>;

    /// Remove one field of a hash, returning how many fields were removed
    async fn hash_delete(&mut self, hash: &str, field: &str) -> CachetResult<u64>;

    /// Drop a whole hash
    async fn delete_hash(&mut self, hash: &str) -> CachetResult<()>;

    /// Prefix this connection applies to every key it is given
    fn key_prefix(&self) -> &str {
        ""
    }
}

/// Source of scoped backend connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection (authenticated, database selected)
    async fn connect(&self) -> CachetResult<Box<dyn KeyValueClient>>;

    /// Human-readable backend name for logs and errors
    fn backend_name(&self) -> &'static str;
}

/// Escape glob metacharacters so a key matches only itself
pub fn escape_glob(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
