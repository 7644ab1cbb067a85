//! Snapshot provider trait definition

use crate::error::Result;
use crate::volume::Volume;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag (AWS) / label (GCE) key marking snapshots created by volsnap
pub const SNAPSHOT_TAG_KEY: &str = "created-by";

/// Value of [`SNAPSHOT_TAG_KEY`]
pub const SNAPSHOT_TAG_VALUE: &str = "volume-backup";

/// Snapshot provider abstraction trait
///
/// Every cloud backend (AWS EBS, GCE PD) implements this trait so the
/// lifecycle orchestrator can drive create/list/expire/delete without
/// knowing which cloud it talks to.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws", "gce")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Snapshot the disk behind `volume`
    ///
    /// Returns `Ok(None)` when the volume is not backed by this provider.
    /// With `dry_run` no mutating call is made and a simulated snapshot is
    /// returned.
    async fn create_snapshot(
        &self,
        volume: &Volume,
        dry_run: bool,
    ) -> Result<Option<CreatedSnapshot>>;

    /// List every snapshot this tool created in the account/project
    async fn list_snapshots(&self) -> Result<Vec<Snapshot>>;

    /// Whether `snapshot` was created strictly before `cutoff`
    fn expired_snapshot(&self, snapshot: &Snapshot, cutoff: DateTime<Utc>) -> bool {
        snapshot.is_older_than(cutoff)
    }

    /// Delete a snapshot; no-op with `dry_run`
    async fn delete_snapshot(&self, snapshot: &Snapshot, dry_run: bool) -> Result<()>;
}

/// Provider-side point-in-time copy of a disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Provider-assigned identifier (EBS snapshot id, GCE snapshot name)
    pub id: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Disk the snapshot was taken from
    pub source_disk: String,

    /// PersistentVolume name recorded at creation time, if tagged
    pub volume_name: Option<String>,
}

impl Snapshot {
    pub fn new(
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        source_disk: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            source_disk: source_disk.into(),
            volume_name: None,
        }
    }

    pub fn with_volume_name(mut self, name: impl Into<String>) -> Self {
        self.volume_name = Some(name.into());
        self
    }

    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at < cutoff
    }
}

/// Result of a successful (or simulated) create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSnapshot {
    pub snapshot: Snapshot,
    pub volume: Volume,

    /// True when no provider call was made
    pub dry_run: bool,
}

impl CreatedSnapshot {
    pub fn new(snapshot: Snapshot, volume: Volume) -> Self {
        Self {
            snapshot,
            volume,
            dry_run: false,
        }
    }

    /// Simulated result returned under dry run
    pub fn simulated(volume: &Volume, source_disk: impl Into<String>) -> Self {
        let snapshot = Snapshot::new("dry-run", Utc::now(), source_disk)
            .with_volume_name(volume.name.clone());
        Self {
            snapshot,
            volume: volume.clone(),
            dry_run: true,
        }
    }
}
