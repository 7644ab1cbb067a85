//! volsnap core
//!
//! PersistentVolume の選別、クラウドスナップショットの作成・削除、
//! 結果を Kubernetes Event として記録するライフサイクル管理を提供する。

pub mod cluster;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod selector;

pub use cluster::{Cluster, KubeCluster};
pub use error::{CoreError, Result};
pub use events::{EventReporter, UNKNOWN_VOLUME};
pub use orchestrator::{Orchestrator, RunOptions, RunReport, retention_cutoff};
pub use selector::{is_eligible, list_eligible_volumes, volume_from_pv};
