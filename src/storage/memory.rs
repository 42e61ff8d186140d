use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::{PersistentStore, StoredVersion};
use crate::collections::CollectionEntry;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<CollectionEntry>,
    history: HashMap<String, Vec<StoredVersion>>,
}

/// Process-local store. Readers share the lock; each write holds it for the
/// whole operation, so no reader sees a half-applied change.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<CollectionEntry>, StorageError> {
        Ok(self.state.read()?.entries.clone())
    }

    fn get(&self, id: &str) -> Result<Option<CollectionEntry>, StorageError> {
        let state = self.state.read()?;
        Ok(state.entries.iter().find(|entry| entry.id() == id).cloned())
    }

    fn upsert(&self, entry: &CollectionEntry) -> Result<(), StorageError> {
        let mut state = self.state.write()?;
        match state.entries.iter_mut().find(|existing| existing.id() == entry.id()) {
            Some(existing) => *existing = entry.clone(),
            None => state.entries.push(entry.clone()),
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut state = self.state.write()?;
        let before = state.entries.len();
        state.entries.retain(|entry| entry.id() != id);
        Ok(state.entries.len() != before)
    }

    fn rename(&self, id: &str, name: &str) -> Result<bool, StorageError> {
        let mut state = self.state.write()?;
        match state.entries.iter_mut().find(|entry| entry.id() == id) {
            Some(entry) => {
                entry.name = Some(name.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn append_history(
        &self,
        request_id: &str,
        snapshot_json: &str,
        created_at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut state = self.state.write()?;
        let versions = state.history.entry(request_id.to_string()).or_default();
        let version = versions.last().map_or(0, |last| last.version) + 1;
        versions.push(StoredVersion {
            version,
            snapshot_json: snapshot_json.to_string(),
            created_at,
        });
        Ok(version)
    }

    fn fetch_history(&self, request_id: &str) -> Result<Vec<StoredVersion>, StorageError> {
        let state = self.state.read()?;
        Ok(state.history.get(request_id).cloned().unwrap_or_default())
    }

    fn read_history_at(
        &self,
        request_id: &str,
        version: u64,
    ) -> Result<Option<StoredVersion>, StorageError> {
        let state = self.state.read()?;
        Ok(state
            .history
            .get(request_id)
            .and_then(|versions| versions.iter().find(|stored| stored.version == version))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestDefinition;

    fn entry(id: &str, url: &str) -> CollectionEntry {
        let mut def = RequestDefinition::with_id(id);
        def.url = url.to_string();
        def
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let store = MemoryStore::new();
        store.upsert(&entry("a", "https://a")).unwrap();
        store.upsert(&entry("b", "https://b")).unwrap();
        store.upsert(&entry("a", "https://a2")).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url, "https://a2");
        assert_eq!(all[1].id(), "b");
    }

    #[test]
    fn delete_and_rename_report_presence() {
        let store = MemoryStore::new();
        store.upsert(&entry("a", "https://a")).unwrap();

        assert!(store.rename("a", "Alpha").unwrap());
        assert!(!store.rename("zzz", "Nope").unwrap());
        assert_eq!(store.get("a").unwrap().unwrap().name.as_deref(), Some("Alpha"));

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
    }

    #[test]
    fn history_versions_are_per_request() {
        let store = MemoryStore::new();
        let now = Utc::now();
        assert_eq!(store.append_history("r1", "{}", now).unwrap(), 1);
        assert_eq!(store.append_history("r1", "{}", now).unwrap(), 2);
        assert_eq!(store.append_history("r2", "{}", now).unwrap(), 1);

        assert_eq!(store.fetch_history("r1").unwrap().len(), 2);
        assert!(store.fetch_history("r3").unwrap().is_empty());
        assert!(store.read_history_at("r1", 3).unwrap().is_none());
        assert_eq!(store.read_history_at("r2", 1).unwrap().unwrap().version, 1);
    }
}
