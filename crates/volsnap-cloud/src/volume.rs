//! Cluster volume model shared by the selector and the providers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provisioner id of the in-tree AWS EBS driver
pub const PROVISIONER_AWS_EBS: &str = "kubernetes.io/aws-ebs";

/// Provisioner id of the in-tree GCE PD driver
pub const PROVISIONER_GCE_PD: &str = "kubernetes.io/gce-pd";

/// Annotation keys carrying the provisioner, newest first
pub const PROVISIONER_ANNOTATIONS: [&str; 2] = [
    "pv.kubernetes.io/provisioned-by",
    "volume.beta.kubernetes.io/storage-provisioner",
];

/// Annotation that opts a volume out of snapshotting
pub const IGNORE_SNAPSHOT_ANNOTATION: &str = "backup.getup.io/ignore-snapshot";

/// Storage driver recognized by volsnap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provisioner {
    AwsEbs,
    GcePd,
}

impl Provisioner {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            PROVISIONER_AWS_EBS => Some(Provisioner::AwsEbs),
            PROVISIONER_GCE_PD => Some(Provisioner::GcePd),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Provisioner::AwsEbs => PROVISIONER_AWS_EBS,
            Provisioner::GcePd => PROVISIONER_GCE_PD,
        }
    }
}

impl std::fmt::Display for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Binding phase of a PersistentVolume
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumePhase {
    Pending,
    Available,
    Bound,
    Released,
    Failed,
    #[default]
    Unknown,
}

impl VolumePhase {
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => VolumePhase::Pending,
            Some("Available") => VolumePhase::Available,
            Some("Bound") => VolumePhase::Bound,
            Some("Released") => VolumePhase::Released,
            Some("Failed") => VolumePhase::Failed,
            _ => VolumePhase::Unknown,
        }
    }
}

/// Claim bound to a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReference {
    pub namespace: String,
    pub name: String,
}

/// Cloud disk backing a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DiskSource {
    AwsEbs { volume_id: String },
    GcePd { pd_name: String },
}

impl DiskSource {
    /// Provider-side disk identifier
    pub fn disk_id(&self) -> &str {
        match self {
            DiskSource::AwsEbs { volume_id } => volume_id,
            DiskSource::GcePd { pd_name } => pd_name,
        }
    }
}

/// A cluster PersistentVolume, reduced to what snapshotting needs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub phase: VolumePhase,
    pub annotations: BTreeMap<String, String>,
    pub claim_ref: Option<ClaimReference>,
    pub disk: Option<DiskSource>,
}

impl Volume {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_phase(mut self, phase: VolumePhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_claim(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.claim_ref = Some(ClaimReference {
            namespace: namespace.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_disk(mut self, disk: DiskSource) -> Self {
        self.disk = Some(disk);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.phase == VolumePhase::Bound
    }

    /// Raw provisioner id, first non-empty annotation wins
    pub fn provisioner_id(&self) -> Option<&str> {
        PROVISIONER_ANNOTATIONS
            .iter()
            .filter_map(|key| self.annotations.get(*key))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }

    /// Recognized provisioner, if any
    pub fn provisioner(&self) -> Option<Provisioner> {
        self.provisioner_id().and_then(Provisioner::from_id)
    }

    /// Whether the ignore annotation is present, whatever its value
    pub fn is_excluded(&self) -> bool {
        self.annotations.contains_key(IGNORE_SNAPSHOT_ANNOTATION)
    }

    /// Claim reference, only for bound volumes
    pub fn claim(&self) -> Option<&ClaimReference> {
        if self.is_bound() {
            self.claim_ref.as_ref()
        } else {
            None
        }
    }
}
