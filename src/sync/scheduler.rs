//! Background build-and-publish worker.
//!
//! Sync requests drain through one FIFO task so store reads (blocking
//! I/O on the db thread) never run on a caller's context. Each cycle is
//! an idempotent whole replace of the published list, so coalesced or
//! reordered triggers cannot corrupt state; a failed cycle is logged and
//! superseded by the next request.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use log::{error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::snapshot::{build_snapshots, SnapshotStore};
use crate::sync::surface::SurfaceNotifier;

enum SyncRequest {
    Publish,
}

#[derive(Clone)]
pub struct SyncScheduler {
    sender: mpsc::UnboundedSender<SyncRequest>,
    cancel: CancellationToken,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SyncScheduler {
    /// Spawn the worker task. Must be called from within a tokio runtime.
    pub fn spawn(db: Database, store: Arc<SnapshotStore>, notifier: SurfaceNotifier) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<SyncRequest>();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("sync worker shutting down");
                        break;
                    }
                    request = receiver.recv() => {
                        let Some(SyncRequest::Publish) = request else { break };
                        if let Err(err) = run_sync_cycle(&db, &store, &notifier).await {
                            error!("sync cycle failed: {err:?}");
                        }
                    }
                }
            }
        });

        Self {
            sender,
            cancel,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Queue a rebuild-and-publish. Fire-and-forget: requests after
    /// shutdown are dropped silently.
    pub fn request_sync(&self) {
        let _ = self.sender.send(SyncRequest::Publish);
    }

    /// Stop the worker and wait for the in-flight cycle, if any.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!("Failed to join sync worker: {err}");
            }
        }
    }
}

async fn run_sync_cycle(
    db: &Database,
    store: &SnapshotStore,
    notifier: &SurfaceNotifier,
) -> Result<()> {
    let now = Utc::now();
    let items = db.load_active_habits(now).await?;
    let snapshots = build_snapshots(&items, now);
    store.publish(&snapshots)?;

    // Publish landed; the refresh hint hops to the notifier context.
    notifier.reload_surfaces();
    Ok(())
}
