//! GCE provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GceError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Google authentication failed: {0}")]
    Auth(String),

    #[error("Volume {0} has no GCE PD name")]
    MissingPdName(String),

    #[error("Invalid creationTimestamp on snapshot {0}")]
    InvalidTimestamp(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<GceError> for volsnap_cloud::CloudError {
    fn from(err: GceError) -> Self {
        match err {
            GceError::Api { message, .. } => volsnap_cloud::CloudError::Provider(message),
            GceError::Auth(message) => volsnap_cloud::CloudError::AuthenticationFailed(message),
            GceError::MissingPdName(name) => volsnap_cloud::CloudError::MissingDiskSource(name),
            other => volsnap_cloud::CloudError::Provider(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GceError>;
