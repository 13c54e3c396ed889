use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pulse::config::{Config, DatabaseBackend};
use pulse::process::ProcessNode;
use pulse::storage::{PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(SqliteStorage::new(&config.database.url, config.database.max_connections).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(PostgresStorage::new(&config.database.url, config.database.max_connections).await?)
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let node = Arc::new(ProcessNode::new(storage, &config.process));
    if config.process.boot_delay_ms > 0 {
        info!(
            "⏳ Processes accept contracts {}ms after spawn",
            config.process.boot_delay_ms
        );
    }

    let api_router = pulse::api::create_api_router(node);

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 Process node listening on http://{}", api_addr);
    info!("   - Spawn processes with POST http://{}/processes", api_addr);

    axum::serve(api_listener, api_router).await?;

    Ok(())
}
