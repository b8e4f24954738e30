use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_sync::api::router;
use catalog_sync::catalog::CatalogHttpClient;
use catalog_sync::config::AppConfig;
use catalog_sync::db;
use catalog_sync::services::{SyncQueue, SyncService, SyncWorker, SystemClock};
use catalog_sync::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catalog_sync=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, config.db_max_connections).await?;

    let catalog = Arc::new(CatalogHttpClient::new(config.catalog.clone())?);
    let sync = Arc::new(SyncService::new(pool.clone(), catalog, Arc::new(SystemClock)));

    let (jobs, rx) = SyncQueue::new(config.sync_queue_capacity);
    tokio::spawn(SyncWorker::new(sync.clone(), rx).start());

    let state = AppState { db: pool, sync, jobs };
    let app = router(state);

    let addr = config.listen_addr();
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
