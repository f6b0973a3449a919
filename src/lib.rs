//! habitsync keeps sandboxed display surfaces in step with a habit
//! tracker's primary store. The owning process rebuilds a compact
//! progress snapshot per habit and publishes the whole list through a
//! shared key-value region; surface processes read it back and
//! reconstruct running timers from stored markers, without a live tick
//! from this side.

pub mod config;
pub mod db;
pub mod engine;
pub mod snapshot;
pub mod sync;
pub mod timer;

pub use config::SyncPaths;
pub use db::Database;
pub use engine::SyncEngine;
pub use snapshot::{build_snapshots, Progress, ProgressSnapshot, SnapshotStore, StoreError};
pub use sync::{CommandHandler, SurfaceCommand, SurfaceNotifier, SyncScheduler, TimerRun};
pub use timer::SessionMarkers;
