use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{SnapshotStore, StoreError};
use crate::models::Event;

/// Stores the snapshot as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<Event>>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No snapshot file yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let events: Vec<Event> = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), events = events.len(), "Loaded snapshot");
        Ok(Some(events))
    }

    async fn save_snapshot(&self, events: &[Event]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write then rename so a crash never leaves a half-written snapshot.
        let staging = self.staging_path();
        let encoded = serde_json::to_vec_pretty(events)?;
        fs::write(&staging, encoded).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
