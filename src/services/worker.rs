use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::services::sync_service::{SyncJob, SyncReport, SyncService};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Sending half of the job queue, shared by request handlers.
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::Sender<SyncJob>,
}

impl SyncQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SyncJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Never waits: a full queue is reported to the caller instead.
    pub fn submit(&self, job: SyncJob) -> Result<(), AppError> {
        let description = job.describe();
        match self.tx.try_send(job) {
            Ok(()) => {
                info!("Queued {}", description);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!("Sync queue full, rejected {}", description);
                Err(AppError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                error!("Sync worker is gone, dropped {}", description);
                Err(AppError::InternalServerError)
            }
        }
    }
}

/// Runs each queued job on its own task. Jobs are never cancelled; the worker
/// returns once every sender is dropped and all running jobs have finished.
pub struct SyncWorker {
    service: Arc<SyncService>,
    rx: mpsc::Receiver<SyncJob>,
}

impl SyncWorker {
    pub fn new(service: Arc<SyncService>, rx: mpsc::Receiver<SyncJob>) -> Self {
        Self { service, rx }
    }

    pub async fn start(mut self) {
        info!("Starting sync worker");
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                job = self.rx.recv() => match job {
                    Some(job) => {
                        let service = self.service.clone();
                        running.spawn(async move {
                            let description = job.describe();
                            let report = service.run(job).await;
                            (description, report)
                        });
                    }
                    None => break,
                },
                Some(finished) = running.join_next(), if !running.is_empty() => {
                    log_finished(finished);
                }
            }
        }

        while let Some(finished) = running.join_next().await {
            log_finished(finished);
        }
        info!("Sync worker stopped");
    }
}

fn log_finished(finished: Result<(String, SyncReport), JoinError>) {
    match finished {
        Ok((description, report)) => {
            if report.courses_failed > 0 || report.courses_frozen > 0 {
                warn!("Finished {} with problems: {:?}", description, report);
            } else {
                info!("Finished {}: {:?}", description, report);
            }
        }
        Err(e) => error!("Sync job panicked: {}", e),
    }
}
