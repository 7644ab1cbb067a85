//! GCE Persistent Disk provider for volsnap
//!
//! Implements the SnapshotProvider trait against the Compute Engine v1
//! REST API. Requests are authenticated with a service-account token
//! obtained through google-cloud-auth.
//!
//! # Requirements
//!
//! - `GOOGLE_APPLICATION_CREDENTIALS` pointing at a service-account key
//! - `GOOGLE_ZONE` naming the zone the disks live in
//!
//! # Example
//!
//! ```ignore
//! use volsnap_cloud::SnapshotProvider;
//! use volsnap_cloud_gce::GceProvider;
//!
//! let json = std::fs::read_to_string(path)?;
//! let provider = GceProvider::new("my-project", "us-central1-a", &json).await?;
//! let snapshots = provider.list_snapshots().await?;
//! ```

pub mod auth;
pub mod compute;
pub mod error;
pub mod provider;

pub use auth::{AccessTokenSource, ServiceAccountToken, StaticToken};
pub use compute::{COMPUTE_API_BASE, ComputeClient};
pub use error::{GceError, Result};
pub use provider::GceProvider;
