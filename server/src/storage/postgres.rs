use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{SnapshotStore, StoreError};
use crate::models::Event;

const SNAPSHOT_ROW: i16 = 1;

/// Keeps the snapshot as one JSONB row in Postgres.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and runs pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("Successfully connected to database");

        sqlx::migrate!().run(&pool).await?;

        tracing::info!("Migrations run successfully");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<Event>>, StoreError> {
        let row: Option<(Json<Vec<Event>>,)> =
            sqlx::query_as("SELECT events FROM event_snapshots WHERE id = $1")
                .bind(SNAPSHOT_ROW)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(events),)| events))
    }

    async fn save_snapshot(&self, events: &[Event]) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO event_snapshots (id, events, saved_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (id) DO UPDATE SET events = EXCLUDED.events, saved_at = EXCLUDED.saved_at",
        )
        .bind(SNAPSHOT_ROW)
        .bind(Json(events))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
