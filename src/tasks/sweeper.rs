//! Background Expiry Sweep Task
//!
//! Periodically removes expired cache entries so capacity checks and
//! statistics are not skewed by rows nobody has touched since they aged out.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::IllustrationCache;

/// Spawns a background task that sweeps expired entries on an interval.
///
/// The task loops forever, sleeping between sweeps; abort the returned
/// handle during shutdown. A failed sweep is logged and retried on the
/// next tick rather than killing the task.
///
/// # Arguments
/// * `cache` - Shared cache handle
/// * `sweep_interval_secs` - Seconds between sweep runs
pub fn spawn_sweep_task(
    cache: Arc<IllustrationCache>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            interval_secs = sweep_interval_secs,
            "Starting expiry sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.sweep_expired().await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "Expiry sweep removed stale entries");
                }
                Ok(_) => {
                    debug!("Expiry sweep found no stale entries");
                }
                Err(e) => {
                    warn!(error = %e, "Expiry sweep failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ItemKind;
    use crate::config::CacheConfig;

    fn short_ttl_cache() -> Arc<IllustrationCache> {
        let config = CacheConfig {
            max_age_ms: 50,
            ..CacheConfig::default()
        };
        Arc::new(IllustrationCache::open_in_memory(config).unwrap())
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let cache = short_ttl_cache();

        cache
            .put("job-1", 0, ItemKind::Image, "aGVsbG8=", None)
            .await
            .unwrap();

        let handle = spawn_sweep_task(cache.clone(), 1);

        // Wait for the entry to expire and the sweep to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.item_count, 0, "Expired entry should have been swept");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_live_entries() {
        let config = CacheConfig {
            max_age_ms: 60_000,
            ..CacheConfig::default()
        };
        let cache = Arc::new(IllustrationCache::open_in_memory(config).unwrap());

        cache
            .put("job-1", 0, ItemKind::Image, "aGVsbG8=", None)
            .await
            .unwrap();

        let handle = spawn_sweep_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(cache.get("job-1", 0).await.unwrap().is_some());

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache = short_ttl_cache();

        let handle = spawn_sweep_task(cache, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
