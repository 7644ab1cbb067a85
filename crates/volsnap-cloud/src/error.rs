//! Snapshot provider error types

use thiserror::Error;

/// Snapshot provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// Native error text returned by the cloud API, passed through verbatim
    #[error("{0}")]
    Provider(String),

    #[error("Volume {0} has no disk source for this provider")]
    MissingDiskSource(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;
