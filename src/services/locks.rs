use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Advisory per-course locks. Reconciliations of the same course run one
/// after another; different courses never wait on each other. Entries nobody
/// holds or waits on are pruned, so the map only tracks courses in flight.
#[derive(Default)]
pub struct CourseLocks {
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl CourseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, course_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(course_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
