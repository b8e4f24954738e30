use std::sync::Arc;

use sqlx::SqlitePool;

use crate::services::{SyncQueue, SyncService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sync: Arc<SyncService>,
    pub jobs: SyncQueue,
}
