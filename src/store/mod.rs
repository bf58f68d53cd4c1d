//! Vary-aware HTTP response store
//!
//! Stores response variants for a URL as one metadata list plus bodies kept
//! under separate keys.
//!
//! # Key layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `MetaData::<sha1(url)>` | JSON list of (request headers, response headers), newest first |
//! | `DigestKey::<md5(url)>` | Raw response body |
//! | `Lock` (hash) | field = metadata key, value = `1` while a fetch is in flight |

pub mod codec;
mod engine;
pub mod freshness;
pub mod keys;
pub mod vary;

pub use codec::CacheEntry;
pub use engine::CacheStore;
pub use freshness::{FreshnessPolicy, HttpFreshness};
pub use keys::KeyDeriver;
