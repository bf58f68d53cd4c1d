//! CLI command implementations

pub mod config;
pub mod lock;
pub mod lookup;
pub mod purge;

pub use config::execute as config;
pub use lock::{cleanup, lock, status as lock_status, unlock};
pub use lookup::execute as lookup;
pub use purge::execute as purge;
