pub mod cooldown;
pub mod lifecycle;
pub mod locks;
pub mod sync_service;
pub mod worker;

pub use cooldown::{Clock, SystemClock};
pub use sync_service::{SyncJob, SyncReport, SyncService};
pub use worker::{SyncQueue, SyncWorker};
