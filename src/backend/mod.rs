//! Key-value backends for the cache store
//!
//! - `memory`: in-process, shared state, for tests and embedding
//! - `redis`: a Redis server (cargo feature `redis`)

mod client;
mod factory;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use client::{escape_glob, Connector, KeyValueClient};
pub use factory::create_connector;
pub use memory::MemoryConnector;
