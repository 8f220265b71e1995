use dotenvy::dotenv;
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use event_portal_server::config::{Config, StorageBackend};
use event_portal_server::routes::create_routes;
use event_portal_server::services::EventService;
use event_portal_server::state::AppState;
use event_portal_server::storage::{JsonFileStore, MemoryStore, PgSnapshotStore, SnapshotStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store: Arc<dyn SnapshotStore> = match config.storage {
        StorageBackend::File => {
            tracing::info!(path = %config.snapshot_path.display(), "Using JSON file snapshot store");
            Arc::new(JsonFileStore::new(&config.snapshot_path))
        }
        StorageBackend::Postgres => Arc::new(PgSnapshotStore::connect(&config.database_url).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory snapshot store; events are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let events = EventService::bootstrap(store, config.seed_demo_data).await?;
    let app = create_routes(AppState::new(events));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
