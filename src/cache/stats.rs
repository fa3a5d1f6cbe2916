//! Cache Statistics Module
//!
//! Full-table aggregates over the store's true on-disk state.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;

// == Cache Stats ==
/// Aggregate statistics for the whole table.
///
/// Reports on-disk state: expired rows are counted until something
/// deletes them, unlike `get`/`list_for_job` which hide them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Sum of `size_bytes` across all entries
    pub total_bytes: u64,
    /// Number of entries
    pub item_count: u64,
    /// Smallest `created_at` (0 when empty)
    pub oldest_created_at: u64,
    /// Largest `created_at` (0 when empty)
    pub newest_created_at: u64,
}

impl CacheStats {
    // == Read ==
    /// Computes the aggregates in a single scan.
    pub fn read_from(conn: &Connection) -> Result<Self> {
        let stats = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0), COUNT(*), \
             COALESCE(MIN(created_at), 0), COALESCE(MAX(created_at), 0) \
             FROM illustrations",
            [],
            |row| {
                Ok(CacheStats {
                    total_bytes: row.get::<_, i64>(0)?.max(0) as u64,
                    item_count: row.get::<_, i64>(1)?.max(0) as u64,
                    oldest_created_at: row.get::<_, i64>(2)?.max(0) as u64,
                    newest_created_at: row.get::<_, i64>(3)?.max(0) as u64,
                })
            },
        )?;
        Ok(stats)
    }
}
