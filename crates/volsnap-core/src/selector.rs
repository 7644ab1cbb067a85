//! スナップショット対象の PersistentVolume を選別する

use crate::cluster::Cluster;
use crate::error::Result;
use k8s_openapi::api::core::v1::PersistentVolume;
use volsnap_cloud::{ClaimReference, DiskSource, Volume, VolumePhase};

const CSI_DRIVER_AWS_EBS: &str = "ebs.csi.aws.com";
const CSI_DRIVER_GCE_PD: &str = "pd.csi.storage.gke.io";

/// k8s の PersistentVolume を volsnap の `Volume` に変換
///
/// 欠けているフィールドはすべて `None` / `Unknown` として扱う。
pub fn volume_from_pv(pv: &PersistentVolume) -> Volume {
    let metadata = &pv.metadata;
    let spec = pv.spec.as_ref();

    let claim_ref = spec
        .and_then(|s| s.claim_ref.as_ref())
        .and_then(|r| match (&r.namespace, &r.name) {
            (Some(namespace), Some(name)) => Some(ClaimReference {
                namespace: namespace.clone(),
                name: name.clone(),
            }),
            _ => None,
        });

    Volume {
        name: metadata.name.clone().unwrap_or_default(),
        phase: VolumePhase::parse(
            pv.status
                .as_ref()
                .and_then(|status| status.phase.as_deref()),
        ),
        annotations: metadata.annotations.clone().unwrap_or_default(),
        claim_ref,
        disk: disk_source(pv),
    }
}

fn disk_source(pv: &PersistentVolume) -> Option<DiskSource> {
    let spec = pv.spec.as_ref()?;

    if let Some(ebs) = &spec.aws_elastic_block_store {
        return Some(DiskSource::AwsEbs {
            volume_id: last_segment(&ebs.volume_id).to_string(),
        });
    }
    if let Some(pd) = &spec.gce_persistent_disk {
        return Some(DiskSource::GcePd {
            pd_name: pd.pd_name.clone(),
        });
    }

    // 移行済み (CSI) ボリューム
    let csi = spec.csi.as_ref()?;
    let handle = last_segment(&csi.volume_handle).to_string();
    match csi.driver.as_str() {
        CSI_DRIVER_AWS_EBS => Some(DiskSource::AwsEbs { volume_id: handle }),
        CSI_DRIVER_GCE_PD => Some(DiskSource::GcePd { pd_name: handle }),
        _ => None,
    }
}

/// `aws://us-east-1a/vol-0abc` → `vol-0abc`
fn last_segment(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

/// 除外アノテーションなし・Bound・対応プロビジョナーの三条件
pub fn is_eligible(volume: &Volume) -> bool {
    !volume.is_excluded() && volume.is_bound() && volume.provisioner().is_some()
}

/// クラスタの全 PV を取得し、スナップショット対象のみを返す
pub async fn list_eligible_volumes(cluster: &dyn Cluster) -> Result<Vec<Volume>> {
    tracing::info!("--> Listing persistent volumes");

    let volumes: Vec<Volume> = cluster
        .list_persistent_volumes()
        .await?
        .iter()
        .map(volume_from_pv)
        .filter(|volume| {
            let eligible = is_eligible(volume);
            if !eligible {
                tracing::debug!(
                    "Skipping {} (bound={}, provisioner={:?}, excluded={})",
                    volume.name,
                    volume.is_bound(),
                    volume.provisioner_id(),
                    volume.is_excluded()
                );
            }
            eligible
        })
        .collect();

    tracing::info!("--> Found {} persistent volume(s)", volumes.len());
    Ok(volumes)
}
