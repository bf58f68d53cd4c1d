//! Store key derivation
//!
//! Both keys are pure functions of a request's scheme, host and request URI.
//! Metadata keys use SHA1 (160-bit), digest keys MD5, both hex encoded.

use crate::message::CacheRequest;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Separator between a key prefix and its hash
pub const KEY_SEPARATOR: &str = "::";

/// Derives metadata and digest keys under configured prefixes
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    metadata_prefix: String,
    digest_prefix: String,
}

impl KeyDeriver {
    pub fn new(metadata_prefix: impl Into<String>, digest_prefix: impl Into<String>) -> Self {
        Self {
            metadata_prefix: metadata_prefix.into(),
            digest_prefix: digest_prefix.into(),
        }
    }

    /// Key of the variant list for the request's URL
    pub fn metadata_key(&self, request: &CacheRequest) -> String {
        metadata_key(
            &self.metadata_prefix,
            request.scheme(),
            request.host(),
            request.uri(),
        )
    }

    /// Key of the body slot for the request's URL
    pub fn digest_key(&self, request: &CacheRequest) -> String {
        digest_key(
            &self.digest_prefix,
            request.scheme(),
            request.host(),
            request.uri(),
        )
    }
}

/// `<prefix>::<sha1(scheme://host + uri)>`
pub fn metadata_key(prefix: &str, scheme: &str, host: &str, uri: &str) -> String {
    let digest = Sha1::digest(identity(scheme, host, uri).as_bytes());
    format!("{}{}{}", prefix, KEY_SEPARATOR, hex::encode(digest))
}

/// `<prefix>::<md5(scheme://host + uri)>`
pub fn digest_key(prefix: &str, scheme: &str, host: &str, uri: &str) -> String {
    let digest = md5::compute(identity(scheme, host, uri).as_bytes());
    format!("{}{}{:x}", prefix, KEY_SEPARATOR, digest)
}

/// Body key for content-addressed layouts: `<digest_key>::<sha256(body)>`
pub fn content_key(digest_key: &str, body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("{}{}{}", digest_key, KEY_SEPARATOR, hex::encode(digest))
}

fn identity(scheme: &str, host: &str, uri: &str) -> String {
    format!("{}://{}{}", scheme, host, uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_key_is_prefixed_sha1() {
        let key = metadata_key("MetaData", "http", "example.com", "/a");
        assert_eq!(
            key,
            format!(
                "MetaData::{}",
                hex::encode(Sha1::digest(b"http://example.com/a"))
            )
        );
        assert_eq!(key.len(), "MetaData::".len() + 40);
    }

    #[test]
    fn digest_key_is_prefixed_md5() {
        let key = digest_key("DigestKey", "http", "example.com", "/a");
        assert_eq!(
            key,
            format!("DigestKey::{:x}", md5::compute(b"http://example.com/a"))
        );
        assert_eq!(key.len(), "DigestKey::".len() + 32);
    }

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let deriver = KeyDeriver::new("MetaData", "DigestKey");
        let a = CacheRequest::get("http://example.com/a").unwrap();
        let b = CacheRequest::get("http://example.com/b").unwrap();

        assert_eq!(deriver.metadata_key(&a), deriver.metadata_key(&a));
        assert_ne!(deriver.metadata_key(&a), deriver.metadata_key(&b));
        assert_ne!(deriver.digest_key(&a), deriver.digest_key(&b));
    }

    #[test]
    fn keys_ignore_method_and_headers() {
        let deriver = KeyDeriver::new("MetaData", "DigestKey");
        let get = CacheRequest::get("http://example.com/a").unwrap();
        let purge = CacheRequest::new("PURGE", "http://example.com/a")
            .unwrap()
            .with_header("Cookie", "a=1");

        assert_eq!(deriver.metadata_key(&get), deriver.metadata_key(&purge));
        assert_eq!(deriver.digest_key(&get), deriver.digest_key(&purge));
    }

    #[test]
    fn query_string_is_part_of_identity() {
        let deriver = KeyDeriver::new("MetaData", "DigestKey");
        let plain = CacheRequest::get("http://example.com/a").unwrap();
        let query = CacheRequest::get("http://example.com/a?page=2").unwrap();

        assert_ne!(deriver.metadata_key(&plain), deriver.metadata_key(&query));
    }

    #[test]
    fn content_key_extends_digest_key() {
        let base = digest_key("DigestKey", "http", "example.com", "/a");
        let one = content_key(&base, b"hello");
        let two = content_key(&base, b"world");

        assert!(one.starts_with(&format!("{}::", base)));
        assert_ne!(one, two);
        assert_eq!(one.len(), base.len() + 2 + 64);
    }
}
