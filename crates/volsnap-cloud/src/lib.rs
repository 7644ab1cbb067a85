//! volsnap Cloud Snapshot Providers
//!
//! This crate provides the snapshot provider abstraction for volsnap,
//! letting the lifecycle orchestrator snapshot and reap disks on any
//! supported cloud through one interface.
//!
//! # Supported Providers
//!
//! - **AWS**: EBS snapshots (via aws-sdk-ec2)
//! - **GCE**: Persistent Disk snapshots (via the Compute Engine REST API)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   volsnap CLI                    │
//! │          (create phase / cleanup phase)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                volsnap-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait SnapshotProvider { ... }           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Volume model │  │  Snapshot    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │   aws (EBS)   │ │   gce (PD)    │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod volume;

// Re-exports
pub use error::{CloudError, Result};
pub use provider::{
    CreatedSnapshot, SNAPSHOT_TAG_KEY, SNAPSHOT_TAG_VALUE, Snapshot, SnapshotProvider,
};
pub use volume::{
    ClaimReference, DiskSource, IGNORE_SNAPSHOT_ANNOTATION, PROVISIONER_ANNOTATIONS,
    PROVISIONER_AWS_EBS, PROVISIONER_GCE_PD, Provisioner, Volume, VolumePhase,
};
