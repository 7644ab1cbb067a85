//! AWS EBS snapshot provider implementation

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::primitives::DateTime as AwsDateTime;
use aws_sdk_ec2::types::{Filter, ResourceType, Tag, TagSpecification};
use chrono::{DateTime, Utc};
use volsnap_cloud::{
    CreatedSnapshot, DiskSource, Provisioner, SNAPSHOT_TAG_KEY, SNAPSHOT_TAG_VALUE, Snapshot,
    SnapshotProvider, Volume,
};

const TAG_PV_NAME: &str = "kubernetes.io/created-for/pv/name";
const TAG_PVC_NAMESPACE: &str = "kubernetes.io/created-for/pvc/namespace";
const TAG_PVC_NAME: &str = "kubernetes.io/created-for/pvc/name";

/// AWS EBS provider
pub struct AwsProvider {
    client: Client,
}

impl AwsProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS environment
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        tracing::debug!(
            "Loaded AWS config for region {}",
            config
                .region()
                .map(|r| r.as_ref().to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );
        Self::new(Client::new(&config))
    }

    async fn create(&self, volume: &Volume, volume_id: &str) -> Result<Snapshot> {
        let mut spec = TagSpecification::builder().resource_type(ResourceType::Snapshot);
        for (key, value) in snapshot_tags(volume) {
            spec = spec.tags(Tag::builder().key(key).value(value).build());
        }

        tracing::debug!("CreateSnapshot volume_id={}", volume_id);

        let output = self
            .client
            .create_snapshot()
            .volume_id(volume_id)
            .description(format!("Created by {} for {}", SNAPSHOT_TAG_VALUE, volume.name))
            .tag_specifications(spec.build())
            .send()
            .await
            .map_err(|e| AwsError::Sdk(sdk_error_text(&e)))?;

        let id = output
            .snapshot_id()
            .ok_or(AwsError::MissingField("SnapshotId"))?
            .to_string();
        let created_at = match output.start_time() {
            Some(time) => to_chrono(time).ok_or_else(|| AwsError::InvalidTimestamp(id.clone()))?,
            None => Utc::now(),
        };

        Ok(Snapshot::new(id, created_at, volume_id).with_volume_name(volume.name.clone()))
    }

    async fn list(&self) -> Result<Vec<Snapshot>> {
        let filter = Filter::builder()
            .name(format!("tag:{}", SNAPSHOT_TAG_KEY))
            .values(SNAPSHOT_TAG_VALUE)
            .build();

        let mut snapshots = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_snapshots()
                .owner_ids("self")
                .filters(filter.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| AwsError::Sdk(sdk_error_text(&e)))?;

            snapshots.extend(usable_snapshots(output.snapshots()));

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::debug!("DescribeSnapshots returned {} snapshot(s)", snapshots.len());
        Ok(snapshots)
    }

    async fn delete(&self, snapshot_id: &str) -> Result<()> {
        self.client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .send()
            .await
            .map_err(|e| AwsError::Sdk(sdk_error_text(&e)))?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn display_name(&self) -> &str {
        "AWS EBS"
    }

    async fn create_snapshot(
        &self,
        volume: &Volume,
        dry_run: bool,
    ) -> volsnap_cloud::Result<Option<CreatedSnapshot>> {
        if volume.provisioner() != Some(Provisioner::AwsEbs) {
            tracing::debug!("Skipping {}: not an EBS volume", volume.name);
            return Ok(None);
        }

        let volume_id = match &volume.disk {
            Some(DiskSource::AwsEbs { volume_id }) => volume_id.clone(),
            _ => return Err(AwsError::MissingVolumeId(volume.name.clone()).into()),
        };

        if dry_run {
            tracing::info!("[dry-run] Would snapshot {} ({})", volume.name, volume_id);
            return Ok(Some(CreatedSnapshot::simulated(volume, volume_id)));
        }

        tracing::info!("Creating snapshot of {} ({})", volume.name, volume_id);
        let snapshot = self.create(volume, &volume_id).await?;
        tracing::info!("Created snapshot {} of {}", snapshot.id, volume.name);

        Ok(Some(CreatedSnapshot::new(snapshot, volume.clone())))
    }

    async fn list_snapshots(&self) -> volsnap_cloud::Result<Vec<Snapshot>> {
        Ok(self.list().await?)
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
        self.delete(&snapshot.id).await?;
        Ok(())
    }
}

/// Tags put on every snapshot volsnap creates
fn snapshot_tags(volume: &Volume) -> Vec<(String, String)> {
    let mut tags = vec![
        (SNAPSHOT_TAG_KEY.to_string(), SNAPSHOT_TAG_VALUE.to_string()),
        ("Name".to_string(), format!("{}-{}", volume.name, Utc::now().format("%Y%m%d%H%M%S"))),
        (TAG_PV_NAME.to_string(), volume.name.clone()),
    ];
    if let Some(claim) = volume.claim() {
        tags.push((TAG_PVC_NAMESPACE.to_string(), claim.namespace.clone()));
        tags.push((TAG_PVC_NAME.to_string(), claim.name.clone()));
    }
    tags
}

/// Convert one page, skipping snapshots without an id or start time
fn usable_snapshots(items: &[aws_sdk_ec2::types::Snapshot]) -> Vec<Snapshot> {
    items
        .iter()
        .filter_map(|item| match from_sdk_snapshot(item) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(
                    "Skipping snapshot {}: {}",
                    item.snapshot_id().unwrap_or("<no id>"),
                    e
                );
                None
            }
        })
        .collect()
}

fn from_sdk_snapshot(snapshot: &aws_sdk_ec2::types::Snapshot) -> Result<Snapshot> {
    let id = snapshot
        .snapshot_id()
        .ok_or(AwsError::MissingField("SnapshotId"))?
        .to_string();
    let created_at = snapshot
        .start_time()
        .and_then(to_chrono)
        .ok_or_else(|| AwsError::InvalidTimestamp(id.clone()))?;
    let source_disk = snapshot.volume_id().unwrap_or_default();

    let mut result = Snapshot::new(id, created_at, source_disk);
    if let Some(name) = snapshot
        .tags()
        .iter()
        .find(|t| t.key() == Some(TAG_PV_NAME))
        .and_then(|t| t.value())
    {
        result = result.with_volume_name(name);
    }
    Ok(result)
}

fn to_chrono(time: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

/// Native EC2 error text: `Code: message` when the service supplied them
fn sdk_error_text<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(service) = err.as_service_error() {
        match (service.code(), service.message()) {
            (Some(code), Some(message)) => return format!("{}: {}", code, message),
            (None, Some(message)) => return message.to_string(),
            _ => {}
        }
    }
    DisplayErrorContext(err).to_string()
}
