//! Quota Enforcement Module
//!
//! Guarantees the total-capacity invariant before an insert by evicting
//! the oldest entries until the incoming payload fits.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;

// == Total Size ==
/// Sums `size_bytes` across every row, expired or not.
pub fn total_bytes(conn: &Connection) -> Result<u64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(size_bytes), 0) FROM illustrations",
        [],
        |row| row.get(0),
    )?;
    Ok(total.max(0) as u64)
}

// == Enforce ==
/// Frees enough space for `required_bytes` additional payload bytes.
///
/// Repeatedly deletes the row with the smallest `created_at` (ties broken
/// by `job_id` then `segment_index` so eviction order is reproducible)
/// until `total + required_bytes <= max_total_bytes` or the table is empty.
///
/// If the table empties and the invariant still fails, the single incoming
/// item is larger than the whole capacity. The caller's insert proceeds
/// anyway: a bounded one-item overshoot is accepted instead of refusing
/// the write.
///
/// Returns the number of rows evicted. Runs inside the caller's
/// transaction; nothing is visible to other readers until it commits.
pub fn enforce(conn: &Connection, required_bytes: u64, max_total_bytes: u64) -> Result<usize> {
    let mut total = total_bytes(conn)?;
    let mut evicted = 0usize;

    while total.saturating_add(required_bytes) > max_total_bytes {
        let oldest = conn
            .query_row(
                "SELECT job_id, segment_index, size_bytes FROM illustrations \
                 ORDER BY created_at ASC, job_id ASC, segment_index ASC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let (job_id, segment_index, size_bytes) = match oldest {
            Some(row) => row,
            // Table is empty; accept the single-item overshoot
            None => break,
        };

        conn.execute(
            "DELETE FROM illustrations WHERE job_id = ?1 AND segment_index = ?2",
            params![job_id, segment_index],
        )?;

        debug!(
            job_id = %job_id,
            segment_index,
            size_bytes,
            "Evicted oldest entry to free cache capacity"
        );

        total = total.saturating_sub(size_bytes.max(0) as u64);
        evicted += 1;
    }

    Ok(evicted)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::tests_support::{insert_row, open_test_conn};

    #[test]
    fn test_total_bytes_empty_table() {
        let conn = open_test_conn();
        assert_eq!(total_bytes(&conn).unwrap(), 0);
    }

    #[test]
    fn test_total_bytes_sums_rows() {
        let conn = open_test_conn();
        insert_row(&conn, "job-1", 0, 100, 10);
        insert_row(&conn, "job-1", 1, 200, 20);
        assert_eq!(total_bytes(&conn).unwrap(), 300);
    }

    #[test]
    fn test_enforce_noop_when_room() {
        let conn = open_test_conn();
        insert_row(&conn, "job-1", 0, 100, 10);

        let evicted = enforce(&conn, 50, 1000).unwrap();
        assert_eq!(evicted, 0);
        assert_eq!(total_bytes(&conn).unwrap(), 100);
    }

    #[test]
    fn test_enforce_evicts_oldest_first() {
        let conn = open_test_conn();
        insert_row(&conn, "job-1", 0, 100, 10); // oldest
        insert_row(&conn, "job-1", 1, 100, 20);
        insert_row(&conn, "job-2", 0, 100, 30); // newest

        // Capacity 250, incoming 100: must free down to 150 -> evict one
        let evicted = enforce(&conn, 100, 250).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(total_bytes(&conn).unwrap(), 200);

        // The row with created_at = 10 is the one that went
        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM illustrations WHERE created_at = 10",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_enforce_evicts_multiple() {
        let conn = open_test_conn();
        for i in 0..5 {
            insert_row(&conn, "job-1", i, 100, (i as u64) + 1);
        }

        // Capacity 300, incoming 100: total 500 must drop to 200
        let evicted = enforce(&conn, 100, 300).unwrap();
        assert_eq!(evicted, 3);
        assert_eq!(total_bytes(&conn).unwrap(), 200);
    }

    #[test]
    fn test_enforce_tie_break_by_job_then_segment() {
        let conn = open_test_conn();
        insert_row(&conn, "job-b", 0, 100, 10);
        insert_row(&conn, "job-a", 1, 100, 10);
        insert_row(&conn, "job-a", 0, 100, 10);

        let evicted = enforce(&conn, 100, 300).unwrap();
        assert_eq!(evicted, 1);

        // Same created_at everywhere: job-a segment 0 goes first
        let gone: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM illustrations WHERE job_id = 'job-a' AND segment_index = 0",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(gone, 0);
    }

    #[test]
    fn test_enforce_single_item_overshoot() {
        let conn = open_test_conn();
        insert_row(&conn, "job-1", 0, 100, 10);

        // Incoming item alone exceeds capacity: table drains and the
        // enforcer stops without erroring
        let evicted = enforce(&conn, 5000, 1000).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(total_bytes(&conn).unwrap(), 0);
    }

    #[test]
    fn test_enforce_empty_table_overshoot() {
        let conn = open_test_conn();
        let evicted = enforce(&conn, 5000, 1000).unwrap();
        assert_eq!(evicted, 0);
    }
}
