pub mod builder;
pub mod model;
pub mod store;

pub use builder::build_snapshots;
pub use model::{Progress, ProgressSnapshot};
pub use store::{SnapshotStore, StoreError};
