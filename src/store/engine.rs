//! The cache store
//!
//! Maps requests to stored variants on top of a plain key-value backend.
//! Every public operation opens its own backend connection and drops it
//! before returning.
//!
//! # Concurrency
//!
//! `write` and `invalidate` read the variant list, modify it and write it
//! back as separate backend calls. Two writers racing on one URL lose an
//! update: the last list written wins. Gateways that care serialize origin
//! fetches per URL with `lock`/`unlock`. Locks never expire on their own;
//! `cleanup` is the reset.

use crate::backend::{create_connector, escape_glob, Connector, KeyValueClient};
use crate::config::{Config, StoreConfig};
use crate::error::{CachetError, CachetResult};
use crate::message::{CacheRequest, CachedResponse};
use crate::store::codec::{
    decode_entries, encode_entries, headers_for_storage, response_from_storage, CacheEntry,
    AGE_HEADER, DIGEST_HEADER, VARY_HEADER,
};
use crate::store::freshness::{FreshnessPolicy, HttpFreshness};
use crate::store::keys::{content_key, KeyDeriver};
use crate::store::vary::requests_match;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Value stored in the lock hash for a held lock
const LOCK_MARKER: &str = "1";

/// Vary-aware HTTP response store
pub struct CacheStore {
    connector: Arc<dyn Connector>,
    keys: KeyDeriver,
    lock_key: String,
    ttl: Option<Duration>,
    content_addressed: bool,
    freshness: Box<dyn FreshnessPolicy>,
}

impl CacheStore {
    /// Create a store over `connector` with the given key layout
    pub fn new(connector: Arc<dyn Connector>, config: &StoreConfig) -> Self {
        Self {
            connector,
            keys: KeyDeriver::new(&config.metadata_prefix, &config.digest_prefix),
            lock_key: config.lock_key.clone(),
            ttl: config.ttl(),
            content_addressed: config.content_addressed_bodies,
            freshness: Box::new(HttpFreshness::new()),
        }
    }

    /// Create a store with the backend named in `config`
    pub fn from_config(config: &Config) -> CachetResult<Self> {
        let connector = create_connector(&config.backend)?;
        Ok(Self::new(connector, &config.store))
    }

    /// Replace the freshness rules used by `invalidate`
    pub fn with_freshness(mut self, policy: impl FreshnessPolicy + 'static) -> Self {
        self.freshness = Box::new(policy);
        self
    }

    /// Key layout used for metadata and body keys
    pub fn keys(&self) -> &KeyDeriver {
        &self.keys
    }

    /// Find a stored response for `request`
    ///
    /// Variants are tried newest first, each matched with the `Vary` it was
    /// stored with. Metadata whose body has been evicted is a miss.
    pub async fn lookup(&self, request: &CacheRequest) -> CachetResult<Option<CachedResponse>> {
        let key = self.keys.metadata_key(request);
        let entries = self.entries(&key).await?;
        if entries.is_empty() {
            debug!("Cache miss for {}: no entries", request.url());
            return Ok(None);
        }

        let Some(entry) = entries
            .into_iter()
            .find(|entry| requests_match(entry.vary(), request.headers(), &entry.request))
        else {
            debug!("Cache miss for {}: no matching variant", request.url());
            return Ok(None);
        };

        let Some(digest) = entry.digest().map(str::to_string) else {
            debug!("Cache miss for {}: entry has no body key", request.url());
            return Ok(None);
        };

        match self.load(&digest).await?.filter(|body| !body.is_empty()) {
            Some(body) => {
                debug!("Cache hit for {} ({})", request.url(), digest);
                Ok(response_from_storage(entry.response, body))
            }
            None => {
                debug!("Cache miss for {}: body {} evicted", request.url(), digest);
                Ok(None)
            }
        }
    }

    /// Store `response` as the variant for `request`
    ///
    /// Original responses get their body persisted and an
    /// `x-content-digest` header pointing at it. Variants superseded by this
    /// one are pruned and the new entry goes first. Returns the metadata key.
    pub async fn write(
        &self,
        request: &CacheRequest,
        response: &mut CachedResponse,
    ) -> CachetResult<String> {
        if !response.headers.contains(DIGEST_HEADER) {
            let mut digest = self.keys.digest_key(request);
            if self.content_addressed {
                digest = content_key(&digest, &response.body);
            }
            self.save(&digest, &response.body).await?;
            response.headers.set(DIGEST_HEADER, digest);
        }

        let key = self.keys.metadata_key(request);
        let vary = response.header(VARY_HEADER).unwrap_or("").to_string();
        let request_headers = request.headers().clone();

        let existing = self.entries(&key).await?;
        let before = existing.len();
        let mut entries: Vec<CacheEntry> = existing
            .into_iter()
            .filter(|entry| {
                entry.vary() != vary || !requests_match(&vary, &entry.request, &request_headers)
            })
            .collect();
        debug!(
            "Pruned {} superseded variant(s) for {}",
            before - entries.len(),
            request.url()
        );

        let mut headers = headers_for_storage(response);
        headers.remove(AGE_HEADER);
        entries.insert(0, CacheEntry::new(request_headers, headers));

        self.save(&key, &encode_entries(&entries)?).await?;
        Ok(key)
    }

    /// Force-expire every currently fresh variant for `request`
    ///
    /// Entries are never removed. The list is only rewritten when at least
    /// one entry changed.
    pub async fn invalidate(&self, request: &CacheRequest) -> CachetResult<()> {
        let key = self.keys.metadata_key(request);
        let mut entries = self.entries(&key).await?;
        let mut expired = 0;

        for entry in &mut entries {
            // Headers only; the body is irrelevant to freshness
            let Some(mut response) = response_from_storage(entry.response.clone(), Vec::new())
            else {
                continue;
            };

            if self.freshness.is_fresh(&response) {
                self.freshness.expire(&mut response);
                entry.response = headers_for_storage(&response);
                expired += 1;
            }
        }

        if expired > 0 {
            self.save(&key, &encode_entries(&entries)?).await?;
            debug!("Expired {} variant(s) for {}", expired, request.url());
        }

        Ok(())
    }

    /// Take the stampede lock for `request`; false if already held
    pub async fn lock(&self, request: &CacheRequest) -> CachetResult<bool> {
        let key = self.keys.metadata_key(request);
        let mut conn = self.connector.connect().await?;
        let acquired = conn
            .hash_set_if_absent(&self.lock_key, &key, LOCK_MARKER)
            .await?;
        debug!("Lock {} for {}: acquired={}", self.lock_key, key, acquired);
        Ok(acquired)
    }

    /// Release the lock for `request`; true if a lock was removed
    pub async fn unlock(&self, request: &CacheRequest) -> CachetResult<bool> {
        let key = self.keys.metadata_key(request);
        let mut conn = self.connector.connect().await?;
        let removed = conn.hash_delete(&self.lock_key, &key).await?;
        Ok(removed > 0)
    }

    pub async fn is_locked(&self, request: &CacheRequest) -> CachetResult<bool> {
        let key = self.keys.metadata_key(request);
        let mut conn = self.connector.connect().await?;
        let marker = conn.hash_get(&self.lock_key, &key).await?;
        Ok(marker.as_deref() == Some(LOCK_MARKER))
    }

    /// Remove all metadata and bodies stored for `url`
    ///
    /// Always true once the delete pass completes, even when nothing was
    /// stored. Use `purge_count` to learn whether anything was removed.
    pub async fn purge(&self, url: &str) -> CachetResult<bool> {
        self.purge_count(url).await?;
        Ok(true)
    }

    /// Remove all metadata and bodies stored for `url`, returning how many
    /// backend keys were deleted
    pub async fn purge_count(&self, url: &str) -> CachetResult<usize> {
        let request = CacheRequest::get(url)?;
        let patterns = [
            // Bodies may carry a content suffix
            format!("{}*", escape_glob(&self.keys.digest_key(&request))),
            escape_glob(&self.keys.metadata_key(&request)),
        ];

        let mut conn = self.connector.connect().await?;
        let mut removed = 0;
        for pattern in &patterns {
            let keys = conn.keys_matching(pattern).await?;
            removed += delete_keys(conn.as_mut(), &keys).await?;
        }

        info!("Purged {} key(s) for {}", removed, url);
        Ok(removed)
    }

    /// Drop every stampede lock
    pub async fn cleanup(&self) -> CachetResult<()> {
        let mut conn = self.connector.connect().await?;
        conn.delete_hash(&self.lock_key).await?;
        info!("Cleared lock table {}", self.lock_key);
        Ok(())
    }

    async fn entries(&self, key: &str) -> CachetResult<Vec<CacheEntry>> {
        let raw = self.load(key).await?;
        Ok(decode_entries(raw.as_deref()))
    }

    async fn load(&self, key: &str) -> CachetResult<Option<Vec<u8>>> {
        let mut conn = self.connector.connect().await?;
        conn.get(key).await
    }

    /// Persist `data` under `key`; an empty payload is a no-op
    async fn save(&self, key: &str, data: &[u8]) -> CachetResult<()> {
        if data.is_empty() {
            debug!("Skipping empty payload for {}", key);
            return Ok(());
        }

        let mut conn = self.connector.connect().await?;
        conn.set(key, data, self.ttl)
            .await
            .map_err(|e| CachetError::storage_write(key, e.to_string()))
    }
}

/// Delete enumerated keys, stripping the connection's own key prefix first
async fn delete_keys(conn: &mut dyn KeyValueClient, keys: &[String]) -> CachetResult<usize> {
    let prefix = conn.key_prefix().to_string();
    let mut removed = 0;
    for key in keys {
        let name = key.strip_prefix(prefix.as_str()).unwrap_or(key);
        removed += conn.delete(name).await? as usize;
    }
    Ok(removed)
}
