//! Expiry Sweep Module
//!
//! Removes rows whose age exceeds the configured TTL. Runs inside `put`
//! before quota enforcement so capacity math is not skewed by dead rows,
//! and periodically from the background sweep task.

use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::Result;

// == Full Sweep ==
/// Deletes every row with `now_ms - created_at > max_age_ms`.
///
/// Returns the number of rows removed. Expiry is strict: a row exactly
/// at the age limit survives.
pub fn remove_expired(conn: &Connection, now_ms: u64, max_age_ms: u64) -> Result<usize> {
    let cutoff = now_ms.saturating_sub(max_age_ms);
    let removed = conn.execute(
        "DELETE FROM illustrations WHERE created_at < ?1",
        params![cutoff as i64],
    )?;

    if removed > 0 {
        debug!(removed, cutoff, "Expiry sweep removed stale entries");
    }

    Ok(removed)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::tests_support::{insert_row, open_test_conn};

    #[test]
    fn test_sweep_empty_table() {
        let conn = open_test_conn();
        assert_eq!(remove_expired(&conn, 10_000, 1_000).unwrap(), 0);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let conn = open_test_conn();
        insert_row(&conn, "job-1", 0, 100, 1_000); // expired
        insert_row(&conn, "job-1", 1, 100, 9_500); // live

        let removed = remove_expired(&conn, 10_000, 1_000).unwrap();
        assert_eq!(removed, 1);

        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM illustrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 1);
    }

    #[test]
    fn test_sweep_boundary_row_survives() {
        let conn = open_test_conn();
        // Age exactly equal to max_age_ms
        insert_row(&conn, "job-1", 0, 100, 9_000);

        let removed = remove_expired(&conn, 10_000, 1_000).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_sweep_ttl_longer_than_clock() {
        let conn = open_test_conn();
        insert_row(&conn, "job-1", 0, 100, 5);

        // max_age_ms exceeds now_ms: nothing can be expired
        let removed = remove_expired(&conn, 1_000, 5_000).unwrap();
        assert_eq!(removed, 0);
    }
}
