//! Illust Cache - A persistent illustration cache
//!
//! Stores generated illustration images and generation prompts keyed by
//! (job, segment), with TTL expiration and size-bounded oldest-first
//! eviction.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, IllustrationCache, ItemKind, StoredItem};
pub use codec::DisplayHandle;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
