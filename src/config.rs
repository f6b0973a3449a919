use std::path::{Path, PathBuf};

use crate::snapshot::store::SHARED_NAMESPACE;

/// Filesystem layout for one engine instance: the habit store, the shared
/// snapshot region, and the process-local fallback region.
#[derive(Debug, Clone)]
pub struct SyncPaths {
    pub db_path: PathBuf,
    /// `None` means the shared namespace is not provisioned on this
    /// install; the store degrades to the local region.
    pub shared_region_dir: Option<PathBuf>,
    pub local_region_dir: PathBuf,
}

impl SyncPaths {
    pub fn from_base(base: &Path) -> Self {
        Self {
            db_path: base.join("habitsync.sqlite3"),
            shared_region_dir: Some(base.join(SHARED_NAMESPACE)),
            local_region_dir: base.join("local-region"),
        }
    }

    /// Apply `HABITSYNC_DB_PATH` and `HABITSYNC_SHARED_DIR` overrides.
    /// Setting the shared dir to the empty string marks the namespace as
    /// unprovisioned.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = std::env::var_os("HABITSYNC_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(dir) = std::env::var_os("HABITSYNC_SHARED_DIR") {
            self.shared_region_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        self
    }
}
