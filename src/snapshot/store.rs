//! Publish/read boundary between the owning process and display surfaces.
//!
//! The shared region is a well-known directory both sides can reach; the
//! snapshot list lives under a single fixed key in it. Writes are whole
//! payload replacements with last-writer-wins semantics, so no merge or
//! locking exists to go wrong. Readers run inside latency-constrained
//! render callbacks and only ever touch this local region.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::model::ProgressSnapshot;

/// Namespace directory shared between the owning process and surface
/// processes. Agreed at build time on both sides, never negotiated.
pub const SHARED_NAMESPACE: &str = "group.habitsync.progress";
/// Key holding the encoded snapshot list inside a region.
pub const SNAPSHOT_KEY: &str = "snapshots.json";
/// Payload schema version; readers reject anything else.
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no snapshot region available: {0}")]
    Unavailable(String),
    #[error("failed to encode snapshot payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write snapshot payload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotPayload {
    version: u32,
    snapshots: Vec<ProgressSnapshot>,
}

/// Snapshot store bound to one region directory. Resolution happens once
/// at open: the shared region when it is provisioned, otherwise the
/// process-local fallback (degraded — published data stays invisible to
/// other processes, which is tolerated, not fatal).
pub struct SnapshotStore {
    region_dir: PathBuf,
    degraded: bool,
}

impl SnapshotStore {
    pub fn open(shared_dir: Option<&Path>, local_dir: &Path) -> Result<Self, StoreError> {
        if let Some(shared) = shared_dir {
            match fs::create_dir_all(shared) {
                Ok(()) => {
                    return Ok(Self {
                        region_dir: shared.to_path_buf(),
                        degraded: false,
                    });
                }
                Err(err) => {
                    warn!(
                        "shared region {} unavailable ({err}); falling back to local-only region",
                        shared.display()
                    );
                }
            }
        } else {
            warn!("shared region not provisioned; falling back to local-only region");
        }

        fs::create_dir_all(local_dir)
            .map_err(|err| StoreError::Unavailable(format!("{}: {err}", local_dir.display())))?;

        Ok(Self {
            region_dir: local_dir.to_path_buf(),
            degraded: true,
        })
    }

    /// True when publishes land in the process-local fallback and cannot
    /// reach other processes.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn key_path(&self) -> PathBuf {
        self.region_dir.join(SNAPSHOT_KEY)
    }

    /// Replace the published list wholesale. Encoding happens before any
    /// I/O, so an encoding failure leaves the previous payload untouched.
    pub fn publish(&self, snapshots: &[ProgressSnapshot]) -> Result<(), StoreError> {
        let payload = SnapshotPayload {
            version: PAYLOAD_VERSION,
            snapshots: snapshots.to_vec(),
        };
        let encoded = serde_json::to_vec(&payload)?;

        fs::write(self.key_path(), encoded)?;
        info!(
            "published {} snapshot(s) to {}",
            snapshots.len(),
            self.region_dir.display()
        );
        Ok(())
    }

    /// Current published list. Never fails outward: a missing key, an
    /// undecodable payload, a schema mismatch, or an empty list all read
    /// as the built-in placeholder so surfaces always have something to
    /// render.
    pub fn read(&self) -> Vec<ProgressSnapshot> {
        match self.try_read() {
            Some(snapshots) if !snapshots.is_empty() => snapshots,
            _ => vec![ProgressSnapshot::placeholder()],
        }
    }

    fn try_read(&self) -> Option<Vec<ProgressSnapshot>> {
        let contents = fs::read(self.key_path()).ok()?;
        let payload: SnapshotPayload = match serde_json::from_slice(&contents) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("undecodable snapshot payload ({err}); using placeholder");
                return None;
            }
        };

        if payload.version != PAYLOAD_VERSION {
            warn!(
                "snapshot payload version {} does not match {}; using placeholder",
                payload.version, PAYLOAD_VERSION
            );
            return None;
        }

        Some(payload.snapshots)
    }

    /// First published snapshot with the given id. `None` means "this id
    /// is not in the list", which is distinct from "nothing published"
    /// (that case surfaces the placeholder through `read`).
    pub fn snapshot_for(&self, id: &str) -> Option<ProgressSnapshot> {
        self.read().into_iter().find(|snapshot| snapshot.id == id)
    }
}
