//! Environment driven configuration for volsnap
//!
//! volsnap reads no config file: the cloud provider, the event metadata and
//! the cluster connection mode are all derived from environment variables,
//! which is what a Kubernetes CronJob hands the container.

pub mod credentials;
pub mod error;
pub mod retention;
pub mod runtime;

pub use credentials::{
    AwsCredentials, Credentials, GceCredentials, GceServiceAccount, ProviderSelection,
    select_provider,
};
pub use error::*;
pub use retention::{DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS, RETENTION_DAYS_ENV, RetentionDays};
pub use runtime::RuntimeEnv;
