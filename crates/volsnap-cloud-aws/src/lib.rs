//! AWS EBS provider for volsnap
//!
//! Implements the SnapshotProvider trait on top of the EC2 API.
//!
//! # Requirements
//!
//! - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` in the environment
//! - Region from `AWS_REGION` or `AWS_DEFAULT_REGION`
//!
//! # Example
//!
//! ```ignore
//! use volsnap_cloud::SnapshotProvider;
//! use volsnap_cloud_aws::AwsProvider;
//!
//! let provider = AwsProvider::from_env().await;
//! let snapshots = provider.list_snapshots().await?;
//! ```

pub mod error;
pub mod provider;

pub use error::{AwsError, Result};
pub use provider::AwsProvider;
