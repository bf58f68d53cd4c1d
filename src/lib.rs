//! Cachet - Vary-aware HTTP response cache store
//!
//! Persists HTTP responses for a caching gateway in a key-value backend,
//! keeping one metadata list of variants per URL and the bodies under
//! separate digest keys.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod message;
pub mod store;

pub use error::{CachetError, CachetResult};
pub use message::{CacheRequest, CachedResponse};
pub use store::CacheStore;
