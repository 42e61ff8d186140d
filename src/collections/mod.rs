//! # Collections
//!
//! Named, persisted request definitions the user saved explicitly.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::request::RequestDefinition;
use crate::storage::PersistentStore;

/// A persisted request definition. Its id is the registry key.
pub type CollectionEntry = RequestDefinition;

const COPY_SUFFIX: &str = " (Copy)";

pub struct CollectionRegistry<S> {
    store: Arc<S>,
}

impl<S: PersistentStore> CollectionRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Insert a new entry or overwrite the one with the same id.
    pub fn save(&self, definition: &RequestDefinition) -> Result<()> {
        self.store.upsert(definition)?;
        tracing::info!(id = definition.id(), name = definition.display_name(), "saved collection entry");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<CollectionEntry>> {
        Ok(self.store.get_all()?)
    }

    pub fn get(&self, id: &str) -> Result<CollectionEntry> {
        self.store
            .get(id)?
            .ok_or_else(|| Error::not_found("collection entry", id))
    }

    /// Remove `id`. Removing an id that is not present is a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        if self.store.delete(id)? {
            tracing::info!(id, "deleted collection entry");
        }
        Ok(())
    }

    /// Change only the name of `id`.
    pub fn rename(&self, id: &str, new_name: &str) -> Result<()> {
        if !self.store.rename(id, new_name)? {
            return Err(Error::not_found("collection entry", id));
        }
        tracing::info!(id, new_name, "renamed collection entry");
        Ok(())
    }

    /// Save a deep copy of `id` under a fresh id, named `"<name or url> (Copy)"`.
    ///
    /// The source entry is untouched and the copy starts with no history.
    pub fn clone_entry(&self, id: &str) -> Result<CollectionEntry> {
        let source = self.get(id)?;
        let mut copy = source.duplicate();
        copy.name = Some(format!("{}{COPY_SUFFIX}", source.display_name()));

        self.store.upsert(&copy)?;
        tracing::info!(source = id, id = copy.id(), "cloned collection entry");
        Ok(copy)
    }
}

impl<S> Clone for CollectionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
