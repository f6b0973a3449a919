//! Commands a display surface can trigger against the owning process.
//!
//! Surfaces cannot call into this process; the platform delivers their
//! intent out-of-band and hands it to `CommandHandler`. Commands are
//! idempotent so a duplicate or stale delivery cannot double-count.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Database, HabitMode, TimerSession};
use crate::sync::scheduler::SyncScheduler;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerRun {
    Run,
    Pause,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum SurfaceCommand {
    #[serde(rename_all = "camelCase")]
    SetTimerRunning { habit_id: String, desired: TimerRun },
}

#[derive(Clone)]
pub struct CommandHandler {
    db: Database,
    scheduler: SyncScheduler,
}

impl CommandHandler {
    pub fn new(db: Database, scheduler: SyncScheduler) -> Self {
        Self { db, scheduler }
    }

    pub async fn handle(&self, command: SurfaceCommand) -> Result<()> {
        match command {
            SurfaceCommand::SetTimerRunning { habit_id, desired } => {
                self.set_timer_running(&habit_id, desired).await
            }
        }
    }

    async fn set_timer_running(&self, habit_id: &str, desired: TimerRun) -> Result<()> {
        let Some(habit) = self.db.get_habit(habit_id).await? else {
            // The habit may have been deleted between render and trigger.
            warn!("timer toggle for unknown habit {habit_id}; ignoring");
            return Ok(());
        };

        if habit.mode != HabitMode::Timer {
            warn!("timer toggle for count habit {habit_id}; ignoring");
            return Ok(());
        }

        let now = Utc::now();
        let open = self.db.get_open_session(habit_id).await?;

        match (desired, open) {
            (TimerRun::Run, Some(_)) => {
                // Already running; duplicate trigger.
            }
            (TimerRun::Run, None) => {
                let session = TimerSession {
                    id: Uuid::new_v4().to_string(),
                    habit_id: habit_id.to_string(),
                    started_at: now,
                    ended_at: None,
                    duration_secs: None,
                };
                self.db.insert_timer_session(&session).await?;
                info!("timer started for habit {habit_id} (session {})", session.id);
            }
            (TimerRun::Pause, None) => {
                // Already paused; duplicate trigger.
            }
            (TimerRun::Pause, Some(session)) => {
                let duration_secs = (now - session.started_at).num_seconds().max(0) as u64;
                self.db
                    .close_timer_session(&session.id, now, duration_secs)
                    .await?;
                info!(
                    "timer paused for habit {habit_id} after {duration_secs}s (session {})",
                    session.id
                );
            }
        }

        self.scheduler.request_sync();
        Ok(())
    }
}
