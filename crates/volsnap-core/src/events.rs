//! スナップショット結果を Kubernetes Event として記録する

use crate::cluster::Cluster;
use crate::error::Result;
use chrono::{DateTime, SubsecRound, Utc};
use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use volsnap_cloud::Volume;
use volsnap_config::RuntimeEnv;

/// involvedObject name when the volume is not known
pub const UNKNOWN_VOLUME: &str = "<unknown>";

const SOURCE_COMPONENT: &str = "volume-backup";
const REPORTING_COMPONENT: &str = "backup.getup.io/database";
const INVOLVED_KIND: &str = "PersistentVolumeBackup";

/// Event の生成と送信
pub struct EventReporter {
    cluster: Arc<dyn Cluster>,
    env: RuntimeEnv,
    run_id: i64,
    sequence: AtomicU64,
}

impl EventReporter {
    pub fn new(cluster: Arc<dyn Cluster>, env: RuntimeEnv) -> Self {
        Self {
            cluster,
            env,
            run_id: Utc::now().timestamp_millis(),
            sequence: AtomicU64::new(0),
        }
    }

    /// 結果を Event として送信する
    ///
    /// `error` が空なら Normal/Created、そうでなければ Warning/Failed。
    pub async fn report(&self, volume: Option<&Volume>, error: &str) -> Result<Event> {
        let event = self.build_event(volume, error, Utc::now());
        let namespace = event.metadata.namespace.clone().unwrap_or_default();

        tracing::info!(
            "Generating event: err={} pv={} namespace={} pvc={}",
            error,
            volume.map(|v| v.name.as_str()).unwrap_or(UNKNOWN_VOLUME),
            namespace,
            volume
                .and_then(|v| v.claim())
                .map(|c| c.name.as_str())
                .unwrap_or("")
        );

        self.cluster.create_event(&namespace, &event).await
    }

    /// Event 本体を組み立てる (送信はしない)
    pub fn build_event(&self, volume: Option<&Volume>, error: &str, now: DateTime<Utc>) -> Event {
        let failed = !error.is_empty();
        let now = Time(now.trunc_subsecs(0));

        let namespace = volume
            .and_then(|v| v.claim())
            .map(|c| c.namespace.clone())
            .unwrap_or_else(|| self.env.namespace.clone());
        let involved_name = volume
            .map(|v| v.name.clone())
            .unwrap_or_else(|| UNKNOWN_VOLUME.to_string());

        Event {
            metadata: ObjectMeta {
                name: Some(self.next_event_name()),
                namespace: Some(namespace.clone()),
                ..Default::default()
            },
            type_: Some(if failed { "Warning" } else { "Normal" }.to_string()),
            reason: Some(if failed { "Failed" } else { "Created" }.to_string()),
            message: Some(error.to_string()),
            count: Some(1),
            first_timestamp: Some(now.clone()),
            last_timestamp: Some(now),
            involved_object: ObjectReference {
                kind: Some(INVOLVED_KIND.to_string()),
                namespace: Some(namespace),
                name: Some(involved_name),
                ..Default::default()
            },
            reporting_component: Some(REPORTING_COMPONENT.to_string()),
            reporting_instance: Some(self.env.hostname.clone()),
            source: Some(EventSource {
                component: Some(SOURCE_COMPONENT.to_string()),
                host: Some(SOURCE_COMPONENT.to_string()),
            }),
            ..Default::default()
        }
    }

    /// `volume-backup.<run-millis>.<seq>`: 同一 run 内で重複しない
    fn next_event_name(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}.{}.{}", SOURCE_COMPONENT, self.run_id, seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use k8s_openapi::api::core::v1::PersistentVolume;
    use std::collections::HashSet;
    use volsnap_cloud::VolumePhase;

    struct NoopCluster;

    #[async_trait]
    impl Cluster for NoopCluster {
        async fn list_persistent_volumes(&self) -> Result<Vec<PersistentVolume>> {
            Ok(Vec::new())
        }

        async fn create_event(&self, _namespace: &str, event: &Event) -> Result<Event> {
            Ok(event.clone())
        }
    }

    fn reporter() -> EventReporter {
        let env = RuntimeEnv {
            hostname: "volsnap-abcde".to_string(),
            namespace: "backup".to_string(),
            in_cluster: true,
        };
        EventReporter::new(Arc::new(NoopCluster), env)
    }

    fn bound_volume() -> Volume {
        Volume::new("pv-1")
            .with_phase(VolumePhase::Bound)
            .with_claim("shop", "data-db-0")
    }

    #[test]
    fn test_success_event() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 4, 5).unwrap();
        let event = reporter().build_event(Some(&bound_volume()), "", now);

        assert_eq!(event.type_.as_deref(), Some("Normal"));
        assert_eq!(event.reason.as_deref(), Some("Created"));
        assert_eq!(event.message.as_deref(), Some(""));
        assert_eq!(event.count, Some(1));
        assert_eq!(event.metadata.namespace.as_deref(), Some("shop"));
        assert_eq!(event.involved_object.name.as_deref(), Some("pv-1"));
        assert_eq!(event.involved_object.kind.as_deref(), Some("PersistentVolumeBackup"));
        assert_eq!(event.reporting_instance.as_deref(), Some("volsnap-abcde"));
        assert_eq!(event.first_timestamp, Some(Time(now)));
        assert_eq!(event.first_timestamp, event.last_timestamp);
    }

    #[test]
    fn test_failure_event_without_volume() {
        let event = reporter().build_event(None, "quota exceeded", Utc::now());

        assert_eq!(event.type_.as_deref(), Some("Warning"));
        assert_eq!(event.reason.as_deref(), Some("Failed"));
        assert_eq!(event.message.as_deref(), Some("quota exceeded"));
        assert_eq!(event.metadata.namespace.as_deref(), Some("backup"));
        assert_eq!(event.involved_object.name.as_deref(), Some(UNKNOWN_VOLUME));
    }

    #[test]
    fn test_unbound_volume_uses_default_namespace() {
        let volume = bound_volume().with_phase(VolumePhase::Released);
        let event = reporter().build_event(Some(&volume), "", Utc::now());
        assert_eq!(event.metadata.namespace.as_deref(), Some("backup"));
        assert_eq!(event.involved_object.name.as_deref(), Some("pv-1"));
    }

    #[test]
    fn test_timestamps_serialize_with_z_suffix() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 4, 5).unwrap() + chrono::Duration::milliseconds(750);
        let event = reporter().build_event(None, "", now);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["firstTimestamp"], "2024-05-01T03:04:05Z");
        assert_eq!(value["lastTimestamp"], "2024-05-01T03:04:05Z");
    }

    #[test]
    fn test_event_names_are_unique() {
        let reporter = reporter();
        let now = Utc::now();
        let names: HashSet<String> = (0..100)
            .map(|_| reporter.build_event(None, "", now).metadata.name.unwrap())
            .collect();

        assert_eq!(names.len(), 100);
        assert!(names.iter().all(|n| n.starts_with("volume-backup.")));
    }

    #[tokio::test]
    async fn test_report_sends_to_claim_namespace() {
        let event = reporter().report(Some(&bound_volume()), "").await.unwrap();
        assert_eq!(event.metadata.namespace.as_deref(), Some("shop"));
    }
}
