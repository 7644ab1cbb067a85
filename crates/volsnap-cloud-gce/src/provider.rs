//! GCE Persistent Disk snapshot provider implementation

use crate::auth::{AccessTokenSource, ServiceAccountToken};
use crate::compute::{ApiSnapshot, COMPUTE_API_BASE, ComputeClient};
use crate::error::{GceError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use volsnap_cloud::{
    CreatedSnapshot, DiskSource, Provisioner, SNAPSHOT_TAG_KEY, SNAPSHOT_TAG_VALUE, Snapshot,
    SnapshotProvider, Volume,
};

/// GCE resource names and label values are capped at 63 characters
const MAX_NAME_LEN: usize = 63;

const LABEL_PV_NAME: &str = "pv-name";
const LABEL_PVC_NAMESPACE: &str = "pvc-namespace";
const LABEL_PVC_NAME: &str = "pvc-name";

/// GCE PD provider
pub struct GceProvider {
    compute: ComputeClient,
}

impl GceProvider {
    /// Authenticate with a service-account key against the public API
    pub async fn new(
        project: impl Into<String>,
        zone: impl Into<String>,
        credentials_json: &str,
    ) -> Result<Self> {
        let token = ServiceAccountToken::from_json(credentials_json).await?;
        Ok(Self::with_token_source(
            COMPUTE_API_BASE,
            project,
            zone,
            Arc::new(token),
        ))
    }

    pub fn with_token_source(
        base_url: impl Into<String>,
        project: impl Into<String>,
        zone: impl Into<String>,
        token: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            compute: ComputeClient::new(base_url, project, zone, token),
        }
    }

    async fn create(&self, volume: &Volume, pd_name: &str) -> Result<Snapshot> {
        let now = Utc::now();
        let name = snapshot_name(pd_name, now);

        let operation = self
            .compute
            .create_disk_snapshot(pd_name, &name, snapshot_labels(volume))
            .await?;
        tracing::debug!("createSnapshot operation {} ({:?})", operation.name, operation.status);

        Ok(Snapshot::new(name, now, pd_name).with_volume_name(volume.name.clone()))
    }
}

#[async_trait]
impl SnapshotProvider for GceProvider {
    fn name(&self) -> &str {
        "gce"
    }

    fn display_name(&self) -> &str {
        "Google Compute Engine"
    }

    async fn create_snapshot(
        &self,
        volume: &Volume,
        dry_run: bool,
    ) -> volsnap_cloud::Result<Option<CreatedSnapshot>> {
        if volume.provisioner() != Some(Provisioner::GcePd) {
            tracing::debug!("Skipping {}: not a GCE PD volume", volume.name);
            return Ok(None);
        }

        let pd_name = match &volume.disk {
            Some(DiskSource::GcePd { pd_name }) => pd_name.clone(),
            _ => return Err(GceError::MissingPdName(volume.name.clone()).into()),
        };

        if dry_run {
            tracing::info!("[dry-run] Would snapshot {} ({})", volume.name, pd_name);
            return Ok(Some(CreatedSnapshot::simulated(volume, pd_name)));
        }

        tracing::info!(
            "Creating snapshot of {} ({}) in {}/{}",
            volume.name,
            pd_name,
            self.compute.project(),
            self.compute.zone()
        );
        let snapshot = self.create(volume, &pd_name).await?;
        tracing::info!("Created snapshot {} of {}", snapshot.id, volume.name);

        Ok(Some(CreatedSnapshot::new(snapshot, volume.clone())))
    }

    async fn list_snapshots(&self) -> volsnap_cloud::Result<Vec<Snapshot>> {
        let filter = format!("labels.{}={}", SNAPSHOT_TAG_KEY, SNAPSHOT_TAG_VALUE);
        let items = self.compute.list_snapshots(&filter).await?;

        let snapshots = usable_snapshots(&items);
        tracing::debug!("Listed {} snapshot(s)", snapshots.len());
        Ok(snapshots)
    }

    async fn delete_snapshot(
        &self,
        snapshot: &Snapshot,
        dry_run: bool,
    ) -> volsnap_cloud::Result<()> {
        if dry_run {
            tracing::info!("[dry-run] Would delete snapshot {}", snapshot.id);
            return Ok(());
        }

        tracing::info!("Deleting snapshot {} ({})", snapshot.id, snapshot.created_at);
        self.compute.delete_snapshot(&snapshot.id).await?;
        Ok(())
    }
}

/// `<disk>-<yyyymmddhhmmss>`, kept within the 63 character limit
fn snapshot_name(pd_name: &str, now: DateTime<Utc>) -> String {
    let suffix = now.format("%Y%m%d%H%M%S").to_string();
    let max_prefix = MAX_NAME_LEN - suffix.len() - 1;
    let prefix: String = pd_name.chars().take(max_prefix).collect();
    format!("{}-{}", prefix.trim_end_matches('-'), suffix)
}

/// Lowercase, `[a-z0-9_-]` only, at most 63 characters
fn sanitize_label(value: &str) -> String {
    value
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_NAME_LEN)
        .collect()
}

fn snapshot_labels(volume: &Volume) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(SNAPSHOT_TAG_KEY.to_string(), SNAPSHOT_TAG_VALUE.to_string());
    labels.insert(LABEL_PV_NAME.to_string(), sanitize_label(&volume.name));
    if let Some(claim) = volume.claim() {
        labels.insert(LABEL_PVC_NAMESPACE.to_string(), sanitize_label(&claim.namespace));
        labels.insert(LABEL_PVC_NAME.to_string(), sanitize_label(&claim.name));
    }
    labels
}

/// Convert listed items, skipping the ones that cannot be aged
fn usable_snapshots(items: &[ApiSnapshot]) -> Vec<Snapshot> {
    items
        .iter()
        .filter_map(|item| match from_api_snapshot(item) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Skipping snapshot {}: {}", item.name, e);
                None
            }
        })
        .collect()
}

fn from_api_snapshot(item: &ApiSnapshot) -> Result<Snapshot> {
    let created_at = DateTime::parse_from_rfc3339(&item.creation_timestamp)
        .map_err(|_| GceError::InvalidTimestamp(item.name.clone()))?
        .with_timezone(&Utc);

    let mut snapshot = Snapshot::new(
        item.name.clone(),
        created_at,
        item.source_disk_name().unwrap_or_default(),
    );
    if let Some(pv) = item.labels.get(LABEL_PV_NAME) {
        snapshot = snapshot.with_volume_name(pv.clone());
    }
    Ok(snapshot)
}
