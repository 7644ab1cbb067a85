//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("{0}")]
    Sdk(String),

    #[error("EC2 response is missing {0}")]
    MissingField(&'static str),

    #[error("Volume {0} has no EBS volume id")]
    MissingVolumeId(String),

    #[error("Invalid timestamp on snapshot {0}")]
    InvalidTimestamp(String),
}

impl From<AwsError> for volsnap_cloud::CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Sdk(message) => volsnap_cloud::CloudError::Provider(message),
            AwsError::MissingVolumeId(name) => volsnap_cloud::CloudError::MissingDiskSource(name),
            other => volsnap_cloud::CloudError::Provider(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
