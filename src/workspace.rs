//! Process-wide handles sharing one store.

use std::sync::Arc;

use crate::collections::CollectionRegistry;
use crate::config::Config;
use crate::error::Result;
use crate::history::HistoryLedger;
use crate::http::{Transport, TransportGateway};
use crate::send::Sender;
use crate::storage::{PersistentStore, SqliteStore};

/// Collection registry, history ledger and sender over a single store.
///
/// Dropping the workspace (and every clone of its parts) releases the store.
pub struct Workspace<T, S> {
    pub collections: CollectionRegistry<S>,
    pub history: HistoryLedger<S>,
    pub sender: Sender<T, S>,
}

impl Workspace<Transport, SqliteStore> {
    /// Open the store and transport described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let store = if config.storage.in_memory {
            SqliteStore::open_in_memory()?
        } else {
            SqliteStore::open(config.storage.database_path())?
        };
        let transport = Transport::from_config(&config.transport)?;
        tracing::info!(
            backend = ?config.transport.backend,
            in_memory = config.storage.in_memory,
            "workspace opened"
        );
        Ok(Self::new(Arc::new(transport), Arc::new(store)))
    }
}

impl<T: TransportGateway, S: PersistentStore> Workspace<T, S> {
    pub fn new(transport: Arc<T>, store: Arc<S>) -> Self {
        let history = HistoryLedger::new(Arc::clone(&store));
        Self {
            collections: CollectionRegistry::new(store),
            sender: Sender::new(transport, history.clone()),
            history,
        }
    }
}
