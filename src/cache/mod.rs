//! Local cache for API responses
//!
//! SQLite-backed storage keyed by a fingerprint of the request, with one
//! fixed TTL. Only reads routed through [`CachedLearningClient`] use it.

pub mod client;
pub mod key;
pub mod storage;

use std::time::Duration;

/// Cache TTL configuration
pub struct CacheTtl;

impl CacheTtl {
    /// Applied to every entry
    pub const DEFAULT: Duration = Duration::from_secs(5 * 60); // 5 min
}

// Re-export main types
pub use client::CachedLearningClient;
pub use key::cache_key;
pub use storage::CacheStorage;
