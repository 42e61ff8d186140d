use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::{PersistentStore, StoredVersion};
use crate::collections::CollectionEntry;
use crate::error::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collection_entries (
  id TEXT PRIMARY KEY,
  name TEXT,
  definition_json TEXT NOT NULL,
  updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
);
CREATE TABLE IF NOT EXISTS history_entries (
  request_id TEXT NOT NULL,
  version INTEGER NOT NULL,
  snapshot_json TEXT NOT NULL,
  created_at TEXT NOT NULL,
  PRIMARY KEY (request_id, version)
);";

/// SQLite-backed store. One connection behind a mutex; multi-row changes run
/// in transactions.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened SQLite store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        Ok(self.conn.lock()?)
    }
}

impl PersistentStore for SqliteStore {
    fn get_all(&self) -> Result<Vec<CollectionEntry>, StorageError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT definition_json FROM collection_entries ORDER BY rowid;")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|raw| serde_json::from_str(raw).map_err(StorageError::from))
            .collect()
    }

    fn get(&self, id: &str) -> Result<Option<CollectionEntry>, StorageError> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT definition_json FROM collection_entries WHERE id = ?1;",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| serde_json::from_str(&raw).map_err(StorageError::from))
            .transpose()
    }

    fn upsert(&self, entry: &CollectionEntry) -> Result<(), StorageError> {
        let definition_json = serde_json::to_string(entry)?;
        self.conn()?.execute(
            "INSERT INTO collection_entries (id, name, definition_json, updated_at)
             VALUES (?1, ?2, ?3, strftime('%s','now'))
             ON CONFLICT(id)
             DO UPDATE SET
               name = excluded.name,
               definition_json = excluded.definition_json,
               updated_at = excluded.updated_at;",
            params![entry.id(), entry.name, definition_json],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM collection_entries WHERE id = ?1;", params![id])?;
        Ok(removed > 0)
    }

    fn rename(&self, id: &str, name: &str) -> Result<bool, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw: Option<String> = tx
            .query_row(
                "SELECT definition_json FROM collection_entries WHERE id = ?1;",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(false);
        };

        let mut entry: CollectionEntry = serde_json::from_str(&raw)?;
        entry.name = Some(name.to_string());
        tx.execute(
            "UPDATE collection_entries
             SET name = ?2, definition_json = ?3, updated_at = strftime('%s','now')
             WHERE id = ?1;",
            params![id, name, serde_json::to_string(&entry)?],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn append_history(
        &self,
        request_id: &str,
        snapshot_json: &str,
        created_at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let version: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM history_entries WHERE request_id = ?1;",
            params![request_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO history_entries (request_id, version, snapshot_json, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![request_id, version, snapshot_json, created_at.to_rfc3339()],
        )?;
        tx.commit()?;
        version_from_sql(version)
    }

    fn fetch_history(&self, request_id: &str) -> Result<Vec<StoredVersion>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT version, snapshot_json, created_at FROM history_entries
             WHERE request_id = ?1 ORDER BY version ASC;",
        )?;
        let rows = stmt
            .query_map(params![request_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(version, snapshot_json, created_at)| {
                stored_version(version_from_sql(version)?, snapshot_json, &created_at)
            })
            .collect()
    }

    fn read_history_at(
        &self,
        request_id: &str,
        version: u64,
    ) -> Result<Option<StoredVersion>, StorageError> {
        // Versions beyond i64 can never have been written.
        let Ok(sql_version) = i64::try_from(version) else {
            return Ok(None);
        };
        let row: Option<(String, String)> = self
            .conn()?
            .query_row(
                "SELECT snapshot_json, created_at FROM history_entries
                 WHERE request_id = ?1 AND version = ?2;",
                params![request_id, sql_version],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(snapshot_json, created_at)| stored_version(version, snapshot_json, &created_at))
            .transpose()
    }
}

fn version_from_sql(version: i64) -> Result<u64, StorageError> {
    u64::try_from(version)
        .ok()
        .filter(|version| *version > 0)
        .ok_or_else(|| StorageError::Corrupt(format!("Bad history version `{version}`")))
}

fn stored_version(
    version: u64,
    snapshot_json: String,
    created_at: &str,
) -> Result<StoredVersion, StorageError> {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|err| StorageError::Corrupt(format!("Bad history timestamp `{created_at}`: {err}")))?
        .with_timezone(&Utc);
    Ok(StoredVersion {
        version,
        snapshot_json,
        created_at,
    })
}
