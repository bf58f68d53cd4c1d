//! In-process key-value backend
//!
//! Shares one state across every connection it hands out, so it behaves like
//! a single server seen through short-lived connections. Supports per-key
//! expiry, glob key patterns and an optional key prefix, plus switches that
//! simulate an unreachable server or a server refusing writes.

use crate::backend::client::{escape_glob, Connector, KeyValueClient};
use crate::error::{CachetError, CachetResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

struct StoredValue {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct MemoryState {
    values: HashMap<String, StoredValue>,
    hashes: HashMap<String, HashMap<String, String>>,
}

impl MemoryState {
    fn drop_expired(&mut self) {
        let now = Instant::now();
        self.values.retain(|_, v| !v.is_expired(now));
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<MemoryState>,
    prefix: String,
    offline: AtomicBool,
    reject_writes: AtomicBool,
    connections: AtomicUsize,
}

/// Connector for the in-process backend
#[derive(Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that prefixes every key, like a client-side key prefix option
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                prefix: prefix.into(),
                ..Shared::default()
            }),
        }
    }

    /// Make subsequent `connect` calls fail
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// Make subsequent scalar writes fail
    pub fn set_reject_writes(&self, reject: bool) {
        self.shared.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of connections handed out so far
    pub fn connections_opened(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Raw stored scalar keys (prefix included), sorted
    pub fn raw_keys(&self) -> Vec<String> {
        let Ok(mut state) = self.shared.state.lock() else {
            return Vec::new();
        };
        state.drop_expired();
        let mut keys: Vec<String> = state.values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> CachetResult<Box<dyn KeyValueClient>> {
        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(CachetError::Connection {
                backend: self.backend_name(),
                address: "in-process".to_string(),
                reason: "backend is offline".to_string(),
            });
        }

        let n = self.shared.connections.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Opened memory connection #{}", n);
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
}

impl MemoryConnection {
    fn state(&self) -> CachetResult<MutexGuard<'_, MemoryState>> {
        self.shared
            .state
            .lock()
            .map_err(|_| CachetError::Internal("memory backend state poisoned".to_string()))
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.shared.prefix, key)
    }
}

#[async_trait]
impl KeyValueClient for MemoryConnection {
    async fn get(&mut self, key: &str) -> CachetResult<Option<Vec<u8>>> {
        let key = self.prefixed(key);
        let mut state = self.state()?;
        state.drop_expired();
        Ok(state.values.get(&key).map(|v| v.bytes.clone()))
    }

    async fn set(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) -> CachetResult<()> {
        if self.shared.reject_writes.load(Ordering::SeqCst) {
            return Err(CachetError::backend("SET", "writes rejected"));
        }

        let key = self.prefixed(key);
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.state()?.values.insert(
            key,
            StoredValue {
                bytes: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> CachetResult<u64> {
        let key = self.prefixed(key);
        let mut state = self.state()?;
        state.drop_expired();
        let removed = state.values.remove(&key).is_some() || state.hashes.remove(&key).is_some();
        Ok(u64::from(removed))
    }

    async fn keys_matching(&mut self, pattern: &str) -> CachetResult<Vec<String>> {
        // The prefix is literal even if it contains glob metacharacters
        let pattern = format!("{}{}", escape_glob(self.key_prefix()), pattern);
        let mut state = self.state()?;
        state.drop_expired();

        let mut keys: Vec<String> = state
            .values
            .keys()
            .chain(state.hashes.keys())
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn hash_set_if_absent(
        &mut self,
        hash: &str,
        field: &str,
        value: &str,
    ) -> CachetResult<bool> {
        let hash = self.prefixed(hash);
        let mut state = self.state()?;
        let fields = state.hashes.entry(hash).or_default();
        if fields.contains_key(field) {
            return Ok(false);
        }
        fields.insert(field.to_string(), value.to_string());
        Ok(true)
    }

    async fn hash_get(&mut self, hash: &str, field: &str) -> CachetResult<Option<String>> {
        let hash = self.prefixed(hash);
        let state = self.state()?;
        Ok(state
            .hashes
            .get(&hash)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    async fn hash_delete(&mut self, hash: &str, field: &str) -> CachetResult<u64> {
        let hash = self.prefixed(hash);
        let mut state = self.state()?;
        let Some(fields) = state.hashes.get_mut(&hash) else {
            return Ok(0);
        };
        let removed = fields.remove(field).is_some();
        if fields.is_empty() {
            state.hashes.remove(&hash);
        }
        Ok(u64::from(removed))
    }

    async fn delete_hash(&mut self, hash: &str) -> CachetResult<()> {
        let hash = self.prefixed(hash);
        self.state()?.hashes.remove(&hash);
        Ok(())
    }

    fn key_prefix(&self) -> &str {
        &self.shared.prefix
    }
}

/// Match `text` against a glob with `*`, `?` and `\` escapes
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Position after the last `*` and the text position it was tried at
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p + 1, t));
                p += 1;
                continue;
            }
            Some(b'?') => {
                p += 1;
                t += 1;
                continue;
            }
            Some(b'\\') if p + 1 < pattern.len() && pattern[p + 1] == text[t] => {
                p += 2;
                t += 1;
                continue;
            }
            Some(&c) if c != b'\\' && c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match star {
            Some((after_star, tried)) => {
                p = after_star;
                t = tried + 1;
                star = Some((after_star, tried + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_literal_and_wildcards() {
        assert!(glob_match(b"MetaData::abc", b"MetaData::abc"));
        assert!(!glob_match(b"MetaData::abc", b"MetaData::abcd"));
        assert!(glob_match(b"DigestKey::ab*", b"DigestKey::abcdef"));
        assert!(glob_match(b"DigestKey::ab*", b"DigestKey::ab"));
        assert!(glob_match(b"*::c?", b"x::cd"));
        assert!(!glob_match(b"*::c?", b"x::c"));
        assert!(glob_match(b"a\\*b", b"a*b"));
        assert!(!glob_match(b"a\\*b", b"axb"));
    }

    #[tokio::test]
    async fn set_get_delete() {
        let connector = MemoryConnector::new();
        let mut conn = connector.connect().await.unwrap();

        conn.set("k", b"v", None).await.unwrap();
        assert_eq!(conn.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(conn.delete("k").await.unwrap(), 1);
        assert_eq!(conn.delete("k").await.unwrap(), 0);
        assert_eq!(conn.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn prefix_is_matched_literally() {
        let connector = MemoryConnector::with_prefix("a*");
        let mut conn = connector.connect().await.unwrap();
        conn.set("b", b"1", None).await.unwrap();
        conn.set("xb", b"2", None).await.unwrap();

        assert_eq!(conn.keys_matching("b").await.unwrap(), vec!["a*b".to_string()]);
        assert_eq!(conn.keys_matching("*b").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ttl_expires_value() {
        let connector = MemoryConnector::new();
        let mut conn = connector.connect().await.unwrap();

        conn.set("short", b"v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(conn.get("short").await.unwrap(), None);
        assert!(conn.keys_matching("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn state_is_shared_across_connections() {
        let connector = MemoryConnector::new();
        connector
            .connect()
            .await
            .unwrap()
            .set("k", b"v", None)
            .await
            .unwrap();

        let mut second = connector.connect().await.unwrap();
        assert_eq!(second.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(connector.connections_opened(), 2);
    }

    #[tokio::test]
    async fn prefix_is_applied_and_reported() {
        let connector = MemoryConnector::with_prefix("app:");
        let mut conn = connector.connect().await.unwrap();

        conn.set("k", b"v", None).await.unwrap();
        assert_eq!(connector.raw_keys(), vec!["app:k".to_string()]);
        assert_eq!(conn.keys_matching("k*").await.unwrap(), vec!["app:k".to_string()]);
        assert_eq!(conn.key_prefix(), "app:");
    }

    #[tokio::test]
    async fn hash_set_if_absent_first_wins() {
        let connector = MemoryConnector::new();
        let mut conn = connector.connect().await.unwrap();

        assert!(conn.hash_set_if_absent("Lock", "f", "1").await.unwrap());
        assert!(!conn.hash_set_if_absent("Lock", "f", "2").await.unwrap());
        assert_eq!(conn.hash_get("Lock", "f").await.unwrap(), Some("1".to_string()));
        assert_eq!(conn.hash_delete("Lock", "f").await.unwrap(), 1);
        assert_eq!(conn.hash_delete("Lock", "f").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn offline_and_rejecting_backends() {
        let connector = MemoryConnector::new();
        connector.set_offline(true);
        assert!(matches!(
            connector.connect().await,
            Err(CachetError::Connection { .. })
        ));

        connector.set_offline(false);
        connector.set_reject_writes(true);
        let mut conn = connector.connect().await.unwrap();
        assert!(conn.set("k", b"v", None).await.is_err());
    }
}
