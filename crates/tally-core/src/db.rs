//! SQLite persistence adapter.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to keep readers unblocked while a save lands
//! - `busy_timeout = 5s` to reduce transient lock failures
//!
//! Counts are stored one row per count with the item list as a JSON column;
//! every save is an idempotent full-document overwrite keyed by count id, so
//! the most recent save to complete wins.

use crate::error::{Result, TallyError};
use crate::model::Count;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Busy timeout applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Latest schema version understood by this binary.
const LATEST_SCHEMA_VERSION: i64 = 1;

const MIGRATION_V1_SQL: &str = "
CREATE TABLE IF NOT EXISTS counts (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    items      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Shape of the legacy flat key-value store file.
///
/// Older builds kept everything in one JSON document; `migrate_legacy` folds
/// it into the structured store exactly once.
#[derive(Debug, Deserialize)]
struct LegacyStore {
    #[serde(default)]
    counts: BTreeMap<String, Count>,
    #[serde(default)]
    theme: Option<String>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply runtime pragmas, and
    /// migrate the schema to the latest version.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        configure_connection(&conn)?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn)?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Load the whole counts map. Row ids win over any id embedded in the
    /// items payload.
    pub fn load_all(&self) -> Result<BTreeMap<String, Count>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at, items FROM counts")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (id, name, created_at, items_json) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|err| TallyError::InvalidBackup(format!("bad timestamp: {err}")))?
                .with_timezone(&Utc);
            let items = serde_json::from_str(&items_json)?;
            counts.insert(
                id.clone(),
                Count {
                    id,
                    name,
                    created_at,
                    items,
                },
            );
        }
        Ok(counts)
    }

    /// Persist every count as a full-row overwrite inside one transaction.
    pub fn save_all(&mut self, counts: &BTreeMap<String, Count>) -> Result<()> {
        let tx = self.conn.transaction().map_err(classify_write_error)?;
        for (id, count) in counts {
            let items_json = serde_json::to_string(&count.items)?;
            tx.execute(
                "INSERT OR REPLACE INTO counts (id, name, created_at, items)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, count.name, count.created_at.to_rfc3339(), items_json],
            )
            .map_err(classify_write_error)?;
        }
        tx.commit().map_err(classify_write_error)?;
        Ok(())
    }

    /// Delete one count; deleting an absent id is a no-op.
    pub fn delete_one(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM counts WHERE id = ?1", [id])
            .map_err(classify_write_error)?;
        Ok(())
    }

    /// Approximate storage footprint in bytes: serialized JSON length × 2
    /// per stored record (a UTF-16 heuristic, not on-disk accounting).
    pub fn storage_footprint(&self) -> Result<u64> {
        let mut total = 0_u64;
        for count in self.load_all()?.values() {
            total += serialized_size(count)?;
        }
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            let record = serde_json::json!({ "key": key, "value": value });
            total += record.to_string().len() as u64 * 2;
        }
        Ok(total)
    }

    pub fn load_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query_map([key], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(value) => Ok(Some(value?)),
            None => Ok(None),
        }
    }

    pub fn save_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(classify_write_error)?;
        Ok(())
    }

    /// One-time migration from the legacy flat JSON store.
    ///
    /// Returns true when legacy data was folded in. An absent file is a
    /// no-op, and a second run after a successful migration finds nothing
    /// to do because the file is removed on success. An unreadable or
    /// unparsable legacy file is logged and skipped, never fatal.
    pub fn migrate_legacy(&mut self, legacy_path: &Path) -> Result<bool> {
        if !legacy_path.exists() {
            return Ok(false);
        }

        let text = match std::fs::read_to_string(legacy_path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %legacy_path.display(), %err, "cannot read legacy store, skipping migration");
                return Ok(false);
            }
        };
        let legacy: LegacyStore = match serde_json::from_str(&text) {
            Ok(legacy) => legacy,
            Err(err) => {
                tracing::warn!(path = %legacy_path.display(), %err, "legacy store is not valid JSON, skipping migration");
                return Ok(false);
            }
        };

        let mut counts = BTreeMap::new();
        for (id, mut count) in legacy.counts {
            count.id.clone_from(&id);
            counts.insert(id, count);
        }
        let migrated_counts = counts.len();
        self.save_all(&counts)?;
        if let Some(theme) = legacy.theme {
            self.save_setting("theme", &theme)?;
        }
        std::fs::remove_file(legacy_path)?;
        tracing::info!(
            counts = migrated_counts,
            "migrated legacy store into sqlite"
        );
        Ok(true)
    }
}

/// Serialized-size estimate for one count record.
pub fn serialized_size(count: &Count) -> Result<u64> {
    Ok(serde_json::to_string(count)?.len() as u64 * 2)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version < LATEST_SCHEMA_VERSION {
        conn.execute_batch(MIGRATION_V1_SQL)?;
        conn.pragma_update(None, "user_version", LATEST_SCHEMA_VERSION)?;
    }
    Ok(())
}

/// Classify a failed write: `SQLITE_FULL` is the backend's "write rejected
/// due to capacity" signal and maps to the distinguished quota error.
fn classify_write_error(err: rusqlite::Error) -> TallyError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err {
        if code.code == rusqlite::ErrorCode::DiskFull {
            return TallyError::QuotaExceeded;
        }
    }
    TallyError::Storage(err)
}
