//! Cache Store Module
//!
//! Main cache engine: a SQLite-backed table of illustration records with
//! quota enforcement, TTL expiry, and per-job bulk operations. All public
//! operations are async and serialize through one connection; multi-step
//! writes run inside a single transaction so readers never observe a
//! partially applied operation.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::item::{current_timestamp_ms, ItemKind, StoredItem};
use crate::cache::{quota, sweep, CacheStats};
use crate::codec;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Schema ==
/// Current schema version, tracked in `PRAGMA user_version`.
pub(crate) const SCHEMA_VERSION: i64 = 1;

const SELECT_COLUMNS: &str =
    "job_id, segment_index, kind, payload, mime_type, created_at, size_bytes";

/// Creates the schema if absent and stamps the version.
///
/// Idempotent; safe to run on every open. A database stamped with a
/// version newer than this build understands is refused rather than
/// destructively reset.
pub(crate) fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| CacheError::StoreOpen(format!("failed to read schema version: {}", e)))?;

    if version > SCHEMA_VERSION {
        return Err(CacheError::StoreOpen(format!(
            "schema version {} is newer than supported version {}",
            version, SCHEMA_VERSION
        )));
    }

    if version < SCHEMA_VERSION {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS illustrations (
                job_id        TEXT NOT NULL,
                segment_index INTEGER NOT NULL,
                kind          TEXT NOT NULL,
                payload       TEXT NOT NULL,
                mime_type     TEXT,
                created_at    INTEGER NOT NULL,
                size_bytes    INTEGER NOT NULL,
                PRIMARY KEY (job_id, segment_index)
            );
            CREATE INDEX IF NOT EXISTS idx_illustrations_job
                ON illustrations(job_id);
            CREATE INDEX IF NOT EXISTS idx_illustrations_created
                ON illustrations(created_at);",
        )
        .map_err(|e| CacheError::StoreOpen(format!("schema migration failed: {}", e)))?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| CacheError::StoreOpen(format!("failed to stamp schema version: {}", e)))?;
    }

    Ok(())
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<StoredItem> {
    let kind_str: String = row.get(2)?;
    let kind = ItemKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown item kind '{}'", kind_str).into(),
        )
    })?;

    Ok(StoredItem {
        job_id: row.get(0)?,
        segment_index: row.get::<_, i64>(1)?.max(0) as u32,
        kind,
        payload: row.get(3)?,
        mime_type: row.get(4)?,
        created_at: row.get::<_, i64>(5)?.max(0) as u64,
        size_bytes: row.get::<_, i64>(6)?.max(0) as u64,
    })
}

fn item_key(job_id: &str, segment_index: u32) -> String {
    format!("{}/{}", job_id, segment_index)
}

// == Illustration Cache ==
/// Persistent illustration cache with TTL expiry and size-bounded eviction.
///
/// Owns the store handle for its whole lifetime; the handle is released
/// on drop. Share across tasks with `Arc`.
#[derive(Debug)]
pub struct IllustrationCache {
    /// Store connection; the mutex serializes all store transactions
    conn: Mutex<Connection>,
    /// Capacity and TTL limits
    config: CacheConfig,
}

impl IllustrationCache {
    // == Capability Probe ==
    /// Checks whether persistent storage is usable in this environment.
    ///
    /// Probes the storage engine and the configured location without
    /// creating anything that outlives the probe. When this returns
    /// false, `open` fails with [`CacheError::Unsupported`] and callers
    /// are expected to run uncached.
    pub fn is_supported(config: &CacheConfig) -> bool {
        if Connection::open_in_memory().is_err() {
            return false;
        }
        let parent = match config.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        is_writable_location(parent)
    }

    // == Constructor ==
    /// Opens the on-disk store, creating schema and parent directories
    /// as needed.
    ///
    /// # Errors
    /// - [`CacheError::Unsupported`] when the environment has no usable
    ///   persistent storage
    /// - [`CacheError::StoreOpen`] when handle acquisition or migration
    ///   fails
    pub fn open(config: &CacheConfig) -> Result<Self> {
        if !Self::is_supported(config) {
            return Err(CacheError::Unsupported(format!(
                "no writable storage at {}",
                config.db_path.display()
            )));
        }

        let conn = open_connection(&config.db_path)?;
        migrate(&conn)?;

        info!(
            path = %config.db_path.display(),
            max_total_bytes = config.max_total_bytes,
            max_age_ms = config.max_age_ms,
            "Illustration cache opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
        })
    }

    /// Opens a store backed by memory instead of disk. Used by tests.
    pub fn open_in_memory(config: CacheConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CacheError::StoreOpen(format!("failed to open in-memory store: {}", e)))?;
        migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Put ==
    /// Stores an illustration or prompt for (`job_id`, `segment_index`),
    /// overwriting any previous record for that key.
    ///
    /// Within one transaction: expired rows are swept, then the oldest
    /// entries are evicted until the new payload fits the capacity limit,
    /// then the row is upserted with a fresh `created_at`.
    ///
    /// # Arguments
    /// * `job_id` - Owning translation job
    /// * `segment_index` - Position within the job's segment sequence
    /// * `kind` - Payload interpretation
    /// * `payload` - Base64 image data or JSON-serialized prompt
    /// * `mime_type` - Image MIME type; ignored semantics for prompts
    pub async fn put(
        &self,
        job_id: &str,
        segment_index: u32,
        kind: ItemKind,
        payload: &str,
        mime_type: Option<&str>,
    ) -> Result<()> {
        let size_bytes = codec::encoded_size(payload, kind);
        let now = current_timestamp_ms();

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let swept = sweep::remove_expired(&tx, now, self.config.max_age_ms)?;
        let evicted = quota::enforce(&tx, size_bytes, self.config.max_total_bytes)?;

        tx.execute(
            "INSERT OR REPLACE INTO illustrations \
             (job_id, segment_index, kind, payload, mime_type, created_at, size_bytes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                job_id,
                segment_index as i64,
                kind.as_str(),
                payload,
                mime_type,
                now as i64,
                size_bytes as i64
            ],
        )?;

        tx.commit()?;

        debug!(
            job_id,
            segment_index,
            size_bytes,
            swept,
            evicted,
            "Stored cache entry"
        );

        Ok(())
    }

    // == Get ==
    /// Retrieves the record for (`job_id`, `segment_index`).
    ///
    /// An expired record is deleted as a side effect of the read and
    /// reported absent. A prompt record whose payload no longer parses
    /// is a [`CacheError::MalformedPayload`] error, not absence: the row
    /// exists but is unusable, and it is left in place.
    pub async fn get(&self, job_id: &str, segment_index: u32) -> Result<Option<StoredItem>> {
        let now = current_timestamp_ms();
        let conn = self.conn.lock().await;

        let item = conn
            .query_row(
                &format!(
                    "SELECT {} FROM illustrations WHERE job_id = ?1 AND segment_index = ?2",
                    SELECT_COLUMNS
                ),
                params![job_id, segment_index as i64],
                row_to_item,
            )
            .optional()?;

        let item = match item {
            Some(item) => item,
            None => return Ok(None),
        };

        if item.is_expired(now, self.config.max_age_ms) {
            conn.execute(
                "DELETE FROM illustrations WHERE job_id = ?1 AND segment_index = ?2",
                params![job_id, segment_index as i64],
            )?;
            debug!(job_id, segment_index, "Removed expired entry on access");
            return Ok(None);
        }

        if item.kind == ItemKind::Prompt {
            codec::parse_prompt(&item.payload, &item_key(job_id, segment_index))?;
        }

        Ok(Some(item))
    }

    // == List For Job ==
    /// Returns all live records for a job, ordered by segment index.
    ///
    /// Read-only: expired rows are filtered out but not deleted.
    pub async fn list_for_job(&self, job_id: &str) -> Result<Vec<StoredItem>> {
        let now = current_timestamp_ms();
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM illustrations WHERE job_id = ?1 ORDER BY segment_index ASC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![job_id], row_to_item)?;
        let mut items = Vec::new();
        for row in rows {
            let item = row?;
            if !item.is_expired(now, self.config.max_age_ms) {
                items.push(item);
            }
        }

        Ok(items)
    }

    // == Delete ==
    /// Removes the record for (`job_id`, `segment_index`) if present.
    /// No error when absent.
    pub async fn delete(&self, job_id: &str, segment_index: u32) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM illustrations WHERE job_id = ?1 AND segment_index = ?2",
            params![job_id, segment_index as i64],
        )?;
        Ok(())
    }

    // == Delete For Job ==
    /// Removes every record belonging to a job as one atomic statement;
    /// no partial deletion is ever visible to other readers.
    pub async fn delete_for_job(&self, job_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM illustrations WHERE job_id = ?1",
            params![job_id],
        )?;
        debug!(job_id, removed, "Deleted all entries for job");
        Ok(())
    }

    // == Stats ==
    /// Returns full-table aggregates over the true on-disk state.
    /// Expired rows are included until a sweep or access removes them.
    pub async fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn.lock().await;
        CacheStats::read_from(&conn)
    }

    // == Clear All ==
    /// Removes every record unconditionally.
    pub async fn clear_all(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM illustrations", [])?;
        info!(removed, "Cleared illustration cache");
        Ok(())
    }

    // == Sweep Expired ==
    /// Runs a full-table expiry sweep.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let now = current_timestamp_ms();
        let conn = self.conn.lock().await;
        sweep::remove_expired(&conn, now, self.config.max_age_ms)
    }
}

/// Checks that `dir` (or its nearest existing ancestor) is a directory
/// an unnamed temporary file can be created in. The probe file is
/// removed when the handle closes, so nothing persists.
fn is_writable_location(dir: &Path) -> bool {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        if ancestor.exists() {
            return ancestor.is_dir() && tempfile::tempfile_in(ancestor).is_ok();
        }
    }
    // Relative path with no existing ancestor yet
    tempfile::tempfile_in(".").is_ok()
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                CacheError::StoreOpen(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let conn = Connection::open(path)
        .map_err(|e| CacheError::StoreOpen(format!("failed to open {}: {}", path.display(), e)))?;

    // journal_mode returns a row, so pragma_update cannot be used here
    conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))
        .map_err(|e| CacheError::StoreOpen(format!("failed to enable WAL mode: {}", e)))?;

    Ok(conn)
}
