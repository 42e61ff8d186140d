use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

/// In-flight cancellation handles, keyed by request id.
///
/// Several sends of the same id share one channel, so cancelling an id
/// cancels every send of it that is still running.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    senders: Mutex<HashMap<String, broadcast::Sender<()>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: &str) -> broadcast::Receiver<()> {
        self.senders()
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(1).0)
            .subscribe()
    }

    pub fn cancel(&self, id: &str) -> bool {
        if let Some(tx) = self.senders().remove(id) {
            let _ = tx.send(());
            return true;
        }
        false
    }

    /// Drop the channel for `id` once no send is waiting on it.
    /// Call after the receiver from [`register`](Self::register) is dropped.
    pub fn release(&self, id: &str) {
        let mut senders = self.senders();
        if senders.get(id).is_some_and(|tx| tx.receiver_count() == 0) {
            senders.remove(id);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.senders().len()
    }

    fn senders(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<()>>> {
        // The map holds no invariant a panicking holder could break.
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
