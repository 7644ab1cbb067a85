use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::core::v1::{Event, PersistentVolume};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use volsnap_cloud::{
    CloudError, CreatedSnapshot, Provisioner, Snapshot, SnapshotProvider, Volume,
};
use volsnap_config::{RetentionDays, RuntimeEnv};
use volsnap_core::{Cluster, CoreError, EventReporter, Orchestrator, RunOptions};

/// In-memory cluster recording every event it receives
#[derive(Default)]
pub struct FakeCluster {
    pub volumes: Vec<PersistentVolume>,
    pub events: Mutex<Vec<(String, Event)>>,
    pub fail_list: bool,
    pub fail_events: bool,
}

impl FakeCluster {
    pub fn with_volumes(volumes: Vec<PersistentVolume>) -> Self {
        Self {
            volumes,
            ..Default::default()
        }
    }

    /// (namespace, type, reason, involved name, message)
    pub fn event_summary(&self) -> Vec<(String, String, String, String, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(ns, e)| {
                (
                    ns.clone(),
                    e.type_.clone().unwrap_or_default(),
                    e.reason.clone().unwrap_or_default(),
                    e.involved_object.name.clone().unwrap_or_default(),
                    e.message.clone().unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn list_persistent_volumes(&self) -> volsnap_core::Result<Vec<PersistentVolume>> {
        if self.fail_list {
            return Err(CoreError::KubeConfig("connection refused".to_string()));
        }
        Ok(self.volumes.clone())
    }

    async fn create_event(&self, namespace: &str, event: &Event) -> volsnap_core::Result<Event> {
        if self.fail_events {
            return Err(CoreError::KubeConfig("events are forbidden".to_string()));
        }
        self.events
            .lock()
            .unwrap()
            .push((namespace.to_string(), event.clone()));
        Ok(event.clone())
    }
}

/// EBS-only provider backed by a snapshot list
#[derive(Default)]
pub struct FakeProvider {
    pub snapshots: Mutex<Vec<Snapshot>>,
    /// volume name -> error text returned by create
    pub create_errors: HashMap<String, String>,
    /// snapshot id -> error text returned by delete
    pub delete_errors: HashMap<String, String>,
    pub fail_list: bool,
    pub create_calls: Mutex<Vec<String>>,
    pub delete_calls: Mutex<Vec<String>>,
    /// Provider-side mutations actually performed
    pub mutations: Mutex<usize>,
}

impl FakeProvider {
    pub fn with_snapshots(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
            ..Default::default()
        }
    }

    pub fn remaining_ids(&self) -> Vec<String> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        *self.mutations.lock().unwrap()
    }
}

#[async_trait]
impl SnapshotProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn display_name(&self) -> &str {
        "Fake EBS"
    }

    async fn create_snapshot(
        &self,
        volume: &Volume,
        dry_run: bool,
    ) -> volsnap_cloud::Result<Option<CreatedSnapshot>> {
        self.create_calls.lock().unwrap().push(volume.name.clone());

        if volume.provisioner() != Some(Provisioner::AwsEbs) {
            return Ok(None);
        }
        if let Some(message) = self.create_errors.get(&volume.name) {
            return Err(CloudError::Provider(message.clone()));
        }
        let disk = volume
            .disk
            .as_ref()
            .map(|d| d.disk_id().to_string())
            .unwrap_or_default();

        if dry_run {
            return Ok(Some(CreatedSnapshot::simulated(volume, disk)));
        }

        *self.mutations.lock().unwrap() += 1;
        let snapshot = Snapshot::new(format!("snap-{}", volume.name), Utc::now(), disk)
            .with_volume_name(volume.name.clone());
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(Some(CreatedSnapshot::new(snapshot, volume.clone())))
    }

    async fn list_snapshots(&self) -> volsnap_cloud::Result<Vec<Snapshot>> {
        if self.fail_list {
            return Err(CloudError::Provider("UnauthorizedOperation".to_string()));
        }
        Ok(self.snapshots.lock().unwrap().clone())
    }

    async fn delete_snapshot(&self, snapshot: &Snapshot, dry_run: bool) -> volsnap_cloud::Result<()> {
        self.delete_calls.lock().unwrap().push(snapshot.id.clone());

        if let Some(message) = self.delete_errors.get(&snapshot.id) {
            return Err(CloudError::Provider(message.clone()));
        }
        if dry_run {
            return Ok(());
        }

        *self.mutations.lock().unwrap() += 1;
        self.snapshots.lock().unwrap().retain(|s| s.id != snapshot.id);
        Ok(())
    }
}

pub fn env() -> RuntimeEnv {
    RuntimeEnv {
        hostname: "volsnap-test".to_string(),
        namespace: "backup".to_string(),
        in_cluster: false,
    }
}

pub fn options(create: bool, clean: bool, dry_run: bool) -> RunOptions {
    RunOptions {
        create_snapshots: create,
        clean_old_snapshots: clean,
        retention: RetentionDays::parse("14").unwrap(),
        dry_run,
    }
}

pub fn orchestrator(
    cluster: Arc<FakeCluster>,
    provider: Arc<FakeProvider>,
    options: RunOptions,
) -> Orchestrator {
    let reporter = EventReporter::new(cluster.clone(), env());
    Orchestrator::new(cluster, provider, reporter, options)
}

/// Bound EBS PersistentVolume claimed from `namespace`
pub fn ebs_pv(name: &str, namespace: &str) -> PersistentVolume {
    serde_json::from_value(json!({
        "metadata": {
            "name": name,
            "annotations": { "pv.kubernetes.io/provisioned-by": "kubernetes.io/aws-ebs" }
        },
        "spec": {
            "awsElasticBlockStore": { "volumeID": format!("aws://us-east-1a/vol-{}", name) },
            "claimRef": { "namespace": namespace, "name": format!("data-{}", name) }
        },
        "status": { "phase": "Bound" }
    }))
    .unwrap()
}

pub fn gce_pv(name: &str) -> PersistentVolume {
    serde_json::from_value(json!({
        "metadata": {
            "name": name,
            "annotations": { "pv.kubernetes.io/provisioned-by": "kubernetes.io/gce-pd" }
        },
        "spec": { "gcePersistentDisk": { "pdName": format!("pd-{}", name) } },
        "status": { "phase": "Bound" }
    }))
    .unwrap()
}

pub fn ignored_pv(name: &str) -> PersistentVolume {
    let mut pv = ebs_pv(name, "shop");
    pv.metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert("backup.getup.io/ignore-snapshot".to_string(), "true".to_string());
    pv
}

pub fn unbound_pv(name: &str) -> PersistentVolume {
    let mut pv = ebs_pv(name, "shop");
    if let Some(status) = pv.status.as_mut() {
        status.phase = Some("Available".to_string());
    }
    pv
}

pub fn snapshot_aged(id: &str, days: i64) -> Snapshot {
    Snapshot::new(id, Utc::now() - chrono::Duration::days(days), "vol-x")
}
