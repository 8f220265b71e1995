//! Snapshot persistence for the event registry.
//!
//! The registry is loaded once at startup and the full collection is written
//! back after every mutation. Backends only need to store and return an
//! opaque, ordered list of events.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Event;

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use postgres::PgSnapshotStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Snapshot migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Previously saved events, or `None` when nothing has been saved yet.
    async fn load_snapshot(&self) -> Result<Option<Vec<Event>>, StoreError>;

    /// Replaces whatever was saved before with `events`.
    async fn save_snapshot(&self, events: &[Event]) -> Result<(), StoreError>;
}
