//! Gateway hooks
//!
//! `PURGE` is not a standard method. Gateways call `intercept_purge` before
//! their normal lookup so purge requests never reach the cache logic.

use crate::error::CachetResult;
use crate::message::CacheRequest;
use crate::store::CacheStore;
use tracing::info;

pub const PURGE_METHOD: &str = "PURGE";

/// Status line to answer a `PURGE` request with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub status: u16,
    pub reason: &'static str,
}

impl PurgeOutcome {
    pub const PURGED: Self = Self {
        status: 200,
        reason: "Purged",
    };

    pub const NOT_FOUND: Self = Self {
        status: 201,
        reason: "Not found",
    };
}

pub fn is_purge(request: &CacheRequest) -> bool {
    request.method().eq_ignore_ascii_case(PURGE_METHOD)
}

/// Handle `request` if it is a `PURGE`
///
/// Returns `None` for any other method, leaving the request to the gateway.
pub async fn intercept_purge(
    store: &CacheStore,
    request: &CacheRequest,
) -> CachetResult<Option<PurgeOutcome>> {
    if !is_purge(request) {
        return Ok(None);
    }

    let removed = store.purge_count(&request.url()).await?;
    let outcome = if removed > 0 {
        PurgeOutcome::PURGED
    } else {
        PurgeOutcome::NOT_FOUND
    };

    info!(
        "PURGE {} -> {} {}",
        request.url(),
        outcome.status,
        outcome.reason
    );
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryConnector;
    use crate::config::StoreConfig;
    use crate::message::CachedResponse;
    use std::sync::Arc;

    fn store() -> CacheStore {
        CacheStore::new(Arc::new(MemoryConnector::new()), &StoreConfig::default())
    }

    #[tokio::test]
    async fn non_purge_requests_pass_through() {
        let store = store();
        let request = CacheRequest::get("http://example.com/a").unwrap();
        assert_eq!(intercept_purge(&store, &request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_of_cached_url_reports_purged() {
        let store = store();
        let get = CacheRequest::get("http://example.com/a?x=1").unwrap();
        store
            .write(&get, &mut CachedResponse::new(200, "hello"))
            .await
            .unwrap();

        let purge = CacheRequest::new("purge", "http://example.com/a?x=1").unwrap();
        let outcome = intercept_purge(&store, &purge).await.unwrap();

        assert_eq!(outcome, Some(PurgeOutcome::PURGED));
        assert!(store.lookup(&get).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_of_unknown_url_reports_not_found() {
        let store = store();
        let purge = CacheRequest::new("PURGE", "http://example.com/missing").unwrap();

        let outcome = intercept_purge(&store, &purge).await.unwrap();
        assert_eq!(outcome, Some(PurgeOutcome::NOT_FOUND));
    }
}
