//! Entry list encoding and response snapshots
//!
//! A metadata value is the whole variant list for one URL, most recent
//! first, encoded as a single JSON array. Status codes ride along inside the
//! response header snapshot as `x-status`.

use crate::error::CachetResult;
use crate::message::{CachedResponse, Headers};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Synthesized header carrying the numeric status code
pub const STATUS_HEADER: &str = "x-status";
/// Header pointing at the stored body
pub const DIGEST_HEADER: &str = "x-content-digest";
pub const VARY_HEADER: &str = "vary";
pub const AGE_HEADER: &str = "age";

/// One cached variant: the request headers it was stored for and the
/// response headers to replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub request: Headers,
    pub response: Headers,
}

impl CacheEntry {
    pub fn new(request: Headers, response: Headers) -> Self {
        Self { request, response }
    }

    /// `Vary` recorded with this variant, empty when none was sent
    pub fn vary(&self) -> &str {
        self.response.get(VARY_HEADER).unwrap_or("")
    }

    /// Body key recorded with this variant
    pub fn digest(&self) -> Option<&str> {
        self.response.get(DIGEST_HEADER)
    }
}

/// Response headers as persisted: a copy plus `x-status`
///
/// `age` is left alone here; the write path strips it, while invalidation
/// keeps the `age` it set to force expiry.
pub fn headers_for_storage(response: &CachedResponse) -> Headers {
    let mut headers = response.headers.clone();
    headers.set(STATUS_HEADER, response.status.to_string());
    headers
}

/// Rebuild a response from stored headers and a body
///
/// Returns `None` when the snapshot carries no usable status code.
pub fn response_from_storage(mut headers: Headers, body: Vec<u8>) -> Option<CachedResponse> {
    let status = headers
        .remove(STATUS_HEADER)?
        .first()
        .and_then(|s| s.trim().parse::<u16>().ok())?;

    Some(CachedResponse {
        status,
        headers,
        body,
    })
}

/// Encode a full variant list
pub fn encode_entries(entries: &[CacheEntry]) -> CachetResult<Vec<u8>> {
    Ok(serde_json::to_vec(entries)?)
}

/// Decode a variant list; absent or malformed input yields an empty list
pub fn decode_entries(bytes: Option<&[u8]>) -> Vec<CacheEntry> {
    let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_slice(bytes) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding malformed cache metadata: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> CachedResponse {
        CachedResponse::new(404, "gone")
            .with_header("Content-Type", "text/plain")
            .with_header("Age", "12")
    }

    #[test]
    fn storage_headers_carry_status() {
        let headers = headers_for_storage(&response());

        assert_eq!(headers.get(STATUS_HEADER), Some("404"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get(AGE_HEADER), Some("12"));
    }

    #[test]
    fn response_from_storage_strips_status() {
        let headers = headers_for_storage(&response());
        let rebuilt = response_from_storage(headers, b"gone".to_vec()).unwrap();

        assert_eq!(rebuilt, response());
        assert!(!rebuilt.headers.contains(STATUS_HEADER));
    }

    #[test]
    fn response_from_storage_needs_status() {
        let mut headers = Headers::new();
        assert!(response_from_storage(headers.clone(), Vec::new()).is_none());

        headers.set(STATUS_HEADER, "abc");
        assert!(response_from_storage(headers, Vec::new()).is_none());
    }

    #[test]
    fn entry_vary_defaults_to_empty() {
        let plain = CacheEntry::new(Headers::new(), headers_for_storage(&response()));
        assert_eq!(plain.vary(), "");
        assert_eq!(plain.digest(), None);

        let varied = CacheEntry::new(
            Headers::new(),
            headers_for_storage(&response().with_header("Vary", "Cookie")),
        );
        assert_eq!(varied.vary(), "Cookie");
    }

    #[test]
    fn entry_list_keeps_order() {
        let first = CacheEntry::new(
            [("Cookie", "a=1")].into_iter().collect(),
            headers_for_storage(&response()),
        );
        let second = CacheEntry::new(Headers::new(), Headers::new());
        let bytes = encode_entries(&[first.clone(), second.clone()]).unwrap();

        assert_eq!(decode_entries(Some(bytes.as_slice())), vec![first, second]);
    }

    #[test]
    fn decode_tolerates_garbage() {
        assert!(decode_entries(None).is_empty());
        assert!(decode_entries(Some(&b""[..])).is_empty());
        assert!(decode_entries(Some(&b"a:2:{i:0;"[..])).is_empty());
        assert!(decode_entries(Some(&br#"{"request":{}}"#[..])).is_empty());
    }
}
