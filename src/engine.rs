use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use crate::config::SyncPaths;
use crate::db::Database;
use crate::snapshot::SnapshotStore;
use crate::sync::{CommandHandler, SurfaceNotifier, SyncScheduler};

/// The owning process's sync engine: habit store, snapshot store,
/// notifier, and background scheduler wired together.
pub struct SyncEngine {
    db: Database,
    store: Arc<SnapshotStore>,
    notifier: SurfaceNotifier,
    scheduler: SyncScheduler,
    handler: CommandHandler,
}

impl SyncEngine {
    /// Open everything and queue an initial publish. Must be called from
    /// within a tokio runtime.
    pub async fn start(paths: SyncPaths) -> Result<Self> {
        let db = Database::new(paths.db_path.clone())?;

        recover_orphaned_sessions(&db).await?;

        let store = Arc::new(
            SnapshotStore::open(
                paths.shared_region_dir.as_deref(),
                &paths.local_region_dir,
            )
            .context("failed to open snapshot store")?,
        );

        let notifier = SurfaceNotifier::spawn()?;
        let scheduler = SyncScheduler::spawn(db.clone(), store.clone(), notifier.clone());
        let handler = CommandHandler::new(db.clone(), scheduler.clone());

        scheduler.request_sync();

        Ok(Self {
            db,
            store,
            notifier,
            scheduler,
            handler,
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn notifier(&self) -> &SurfaceNotifier {
        &self.notifier
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    pub fn request_sync(&self) {
        self.scheduler.request_sync();
    }

    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
        info!("sync engine stopped");
    }
}

/// Close open timer sessions whose habit no longer exists or is archived.
/// Open sessions of live habits are left running on purpose: a process
/// restart must not silently pause a user's timer.
async fn recover_orphaned_sessions(db: &Database) -> Result<()> {
    let open_sessions = db.list_open_sessions().await?;
    let now = Utc::now();

    for session in open_sessions {
        let habit = db.get_habit(&session.habit_id).await?;
        let keep = habit.map(|habit| !habit.archived).unwrap_or(false);
        if keep {
            continue;
        }

        let duration_secs = (now - session.started_at).num_seconds().max(0) as u64;
        warn!(
            "closing orphaned timer session {} for habit {} ({duration_secs}s)",
            session.id, session.habit_id
        );
        db.close_timer_session(&session.id, now, duration_secs)
            .await?;
    }

    Ok(())
}
