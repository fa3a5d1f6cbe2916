//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::{DEFAULT_MAX_AGE_MS, DEFAULT_MAX_TOTAL_BYTES};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Filesystem path of the store database
    pub db_path: PathBuf,
    /// Maximum total payload size across all entries, in bytes
    pub max_total_bytes: u64,
    /// Maximum entry age in milliseconds before expiry
    pub max_age_ms: u64,
    /// Background expiry sweep interval in seconds
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ILLUST_CACHE_PATH` - Store database path (default: illust-cache.db)
    /// - `ILLUST_CACHE_MAX_BYTES` - Total capacity in bytes (default: 500 MiB)
    /// - `ILLUST_CACHE_MAX_AGE_MS` - Entry TTL in milliseconds (default: 30 days)
    /// - `ILLUST_CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 3600)
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("ILLUST_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("illust-cache.db")),
            max_total_bytes: env::var("ILLUST_CACHE_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOTAL_BYTES),
            max_age_ms: env::var("ILLUST_CACHE_MAX_AGE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_AGE_MS),
            sweep_interval_secs: env::var("ILLUST_CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("illust-cache.db"),
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_age_ms: DEFAULT_MAX_AGE_MS,
            sweep_interval_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.db_path, PathBuf::from("illust-cache.db"));
        assert_eq!(config.max_total_bytes, 500 * 1024 * 1024);
        assert_eq!(config.max_age_ms, 30 * 24 * 60 * 60 * 1000);
        assert_eq!(config.sweep_interval_secs, 3600);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("ILLUST_CACHE_PATH");
        env::remove_var("ILLUST_CACHE_MAX_BYTES");
        env::remove_var("ILLUST_CACHE_MAX_AGE_MS");
        env::remove_var("ILLUST_CACHE_SWEEP_INTERVAL");

        let config = CacheConfig::from_env();
        assert_eq!(config.db_path, PathBuf::from("illust-cache.db"));
        assert_eq!(config.max_total_bytes, DEFAULT_MAX_TOTAL_BYTES);
        assert_eq!(config.max_age_ms, DEFAULT_MAX_AGE_MS);
        assert_eq!(config.sweep_interval_secs, 3600);
    }
}
