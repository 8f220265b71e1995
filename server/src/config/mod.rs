use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SNAPSHOT_PATH: &str = "data/events.json";
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/event_portal";

/// Where the registry snapshot lives between restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "file" | "json" => Some(StorageBackend::File),
            "postgres" | "postgresql" => Some(StorageBackend::Postgres),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub snapshot_path: PathBuf,
    pub database_url: String,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("BIND_ADDR")
            .and_then(|raw| match raw.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("Config: Invalid BIND_ADDR '{}': {}", raw, e);
                    None
                }
            })
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let storage = lookup("STORAGE_BACKEND")
            .and_then(|raw| {
                let parsed = StorageBackend::parse(&raw);
                if parsed.is_none() {
                    tracing::warn!("Config: Unknown STORAGE_BACKEND '{}', using file", raw);
                }
                parsed
            })
            .unwrap_or(StorageBackend::File);

        let seed_demo_data = lookup("SEED_DEMO_DATA")
            .map(|raw| !matches!(raw.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Self {
            bind_addr,
            storage,
            snapshot_path: lookup("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            seed_demo_data,
        }
    }
}
