//! # Request History
//!
//! Append-only, per-request versioned log of what was actually sent.
//!
//! Versions start at 1 for every request id and grow by one on each
//! successful send. Entries are never rewritten, removed or renumbered;
//! reverting only reads an old snapshot back.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::request::Snapshot;
use crate::storage::{PersistentStore, StoredVersion};

/// One recorded version of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub request_id: String,
    pub version: u64,
    pub snapshot: Snapshot,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn from_stored(request_id: &str, stored: StoredVersion) -> Result<Self> {
        Ok(Self {
            request_id: request_id.to_string(),
            version: stored.version,
            snapshot: Snapshot::from_json(&stored.snapshot_json)?,
            created_at: stored.created_at,
        })
    }
}

pub struct HistoryLedger<S> {
    store: Arc<S>,
}

impl<S: PersistentStore> HistoryLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append `snapshot` as the next version of `request_id`.
    ///
    /// Version assignment happens inside the store's atomic append, so
    /// concurrent calls for one id get distinct, gapless versions.
    pub fn record_version(&self, request_id: &str, snapshot: &Snapshot) -> Result<u64> {
        let snapshot_json = snapshot.to_json()?;
        let version = self
            .store
            .append_history(request_id, &snapshot_json, Utc::now())?;
        tracing::debug!(request_id, version, "recorded history version");
        Ok(version)
    }

    /// Every version of `request_id`, oldest first. Empty for unknown ids.
    pub fn list_versions(&self, request_id: &str) -> Result<Vec<HistoryEntry>> {
        self.store
            .fetch_history(request_id)?
            .into_iter()
            .map(|stored| HistoryEntry::from_stored(request_id, stored))
            .collect()
    }

    pub fn get_version(&self, request_id: &str, version: u64) -> Result<HistoryEntry> {
        let stored = self
            .store
            .read_history_at(request_id, version)?
            .ok_or_else(|| Error::not_found("history version", format!("{request_id}@{version}")))?;
        HistoryEntry::from_stored(request_id, stored)
    }

    /// The snapshot recorded as `version`. Does not write to the ledger;
    /// record the applied result explicitly to keep it as a new version.
    pub fn revert(&self, request_id: &str, version: u64) -> Result<Snapshot> {
        Ok(self.get_version(request_id, version)?.snapshot)
    }

    pub fn latest(&self, request_id: &str) -> Result<Option<HistoryEntry>> {
        Ok(self.list_versions(request_id)?.pop())
    }
}

impl<S> Clone for HistoryLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::thread;

    use super::*;
    use crate::encoding::prepare;
    use crate::http::method::HttpMethod;
    use crate::request::RequestDefinition;
    use crate::storage::{MemoryStore, SqliteStore};

    fn snapshot(url: &str) -> Snapshot {
        let mut def = RequestDefinition::with_id("r1");
        def.method = HttpMethod::Post;
        def.url = url.to_string();
        def.add_header("Accept", "*/*");
        Snapshot::capture(&def, &prepare(&def).unwrap())
    }

    fn ledger() -> HistoryLedger<MemoryStore> {
        HistoryLedger::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn versions_start_at_one_and_increase() {
        let ledger = ledger();
        let a = snapshot("https://a");
        let b = snapshot("https://b");

        assert_eq!(ledger.record_version("r1", &a).unwrap(), 1);
        assert_eq!(ledger.record_version("r1", &b).unwrap(), 2);

        let listed = ledger.list_versions("r1").unwrap();
        let pairs: Vec<_> = listed.iter().map(|e| (e.version, e.snapshot.clone())).collect();
        assert_eq!(pairs, vec![(1, a), (2, b)]);
        assert!(listed.iter().all(|entry| entry.request_id == "r1"));
    }

    #[test]
    fn ids_are_independent() {
        let ledger = ledger();
        ledger.record_version("r1", &snapshot("https://a")).unwrap();
        assert_eq!(ledger.record_version("r2", &snapshot("https://b")).unwrap(), 1);
        assert!(ledger.list_versions("never").unwrap().is_empty());
    }

    #[test]
    fn revert_reads_without_appending() {
        let ledger = ledger();
        let a = snapshot("https://a");
        ledger.record_version("r1", &a).unwrap();
        ledger.record_version("r1", &snapshot("https://b")).unwrap();

        assert_eq!(ledger.revert("r1", 1).unwrap(), a);
        assert_eq!(ledger.list_versions("r1").unwrap().len(), 2);
        assert_eq!(ledger.latest("r1").unwrap().unwrap().version, 2);
    }

    #[test]
    fn missing_version_is_not_found() {
        let ledger = ledger();
        ledger.record_version("r1", &snapshot("https://a")).unwrap();

        assert!(matches!(ledger.get_version("r1", 2), Err(Error::NotFound { .. })));
        assert!(matches!(ledger.revert("nope", 1), Err(Error::NotFound { .. })));
        assert!(ledger.latest("nope").unwrap().is_none());
    }

    fn assert_concurrent_versions_are_gapless<S: PersistentStore + 'static>(store: S) {
        const THREADS: u64 = 16;
        let ledger = Arc::new(HistoryLedger::new(Arc::new(store)));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger
                        .record_version("shared", &snapshot(&format!("https://x/{i}")))
                        .unwrap()
                })
            })
            .collect();

        let versions: BTreeSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(versions, (1..=THREADS).collect());
        assert_eq!(ledger.list_versions("shared").unwrap().len(), THREADS as usize);
    }

    #[test]
    fn concurrent_records_in_memory() {
        assert_concurrent_versions_are_gapless(MemoryStore::new());
    }

    #[test]
    fn concurrent_records_in_sqlite() {
        assert_concurrent_versions_are_gapless(SqliteStore::open_in_memory().unwrap());
    }
}
