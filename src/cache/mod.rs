//! Cache Module
//!
//! Persistent illustration caching with TTL expiry and size-bounded,
//! oldest-first eviction.

mod item;
mod quota;
mod stats;
pub(crate) mod store;
mod sweep;


// Re-export public types
pub use item::{current_timestamp_ms, ItemKind, StoredItem};
pub use stats::CacheStats;
pub use store::IllustrationCache;

// == Public Constants ==
/// Default total payload capacity: 500 MiB
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 500 * 1024 * 1024;

/// Default entry TTL: 30 days
pub const DEFAULT_MAX_AGE_MS: u64 = 30 * 24 * 60 * 60 * 1000;
