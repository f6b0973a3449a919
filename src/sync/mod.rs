pub mod commands;
pub mod scheduler;
pub mod surface;

pub use commands::{CommandHandler, SurfaceCommand, TimerRun};
pub use scheduler::SyncScheduler;
pub use surface::SurfaceNotifier;
