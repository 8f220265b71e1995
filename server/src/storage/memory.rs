use async_trait::async_trait;
use std::sync::Mutex;

use super::{SnapshotStore, StoreError};
use crate::models::Event;

/// Keeps the snapshot in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Vec<Event>>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed `save_snapshot` calls.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|count| *count).unwrap_or(0)
    }

    pub fn current(&self) -> Option<Vec<Event>> {
        self.snapshot
            .lock()
            .ok()
            .and_then(|snapshot| snapshot.clone())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<Event>>, StoreError> {
        Ok(self.current())
    }

    async fn save_snapshot(&self, events: &[Event]) -> Result<(), StoreError> {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = Some(events.to_vec());
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
