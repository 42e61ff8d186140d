//! # Persistence
//!
//! The narrow record-store interface the collection registry and history
//! ledger are written against, with an in-memory and a SQLite backend.
//!
//! Every method is a single atomic operation: a failed call leaves the store
//! exactly as it was.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::collections::CollectionEntry;
use crate::error::StorageError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A history row as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVersion {
    pub version: u64,
    pub snapshot_json: String,
    pub created_at: DateTime<Utc>,
}

pub trait PersistentStore: Send + Sync {
    /// All collection entries in insertion order.
    fn get_all(&self) -> Result<Vec<CollectionEntry>, StorageError>;

    fn get(&self, id: &str) -> Result<Option<CollectionEntry>, StorageError>;

    /// Insert, or overwrite the entry with the same id in place.
    fn upsert(&self, entry: &CollectionEntry) -> Result<(), StorageError>;

    /// Returns whether an entry was removed.
    fn delete(&self, id: &str) -> Result<bool, StorageError>;

    /// Returns `false` when no entry has this id.
    fn rename(&self, id: &str, name: &str) -> Result<bool, StorageError>;

    /// Append a snapshot under the next version for `request_id` and return
    /// that version. Concurrent calls never get the same version.
    fn append_history(
        &self,
        request_id: &str,
        snapshot_json: &str,
        created_at: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// All versions of `request_id`, ascending.
    fn fetch_history(&self, request_id: &str) -> Result<Vec<StoredVersion>, StorageError>;

    fn read_history_at(
        &self,
        request_id: &str,
        version: u64,
    ) -> Result<Option<StoredVersion>, StorageError>;
}
