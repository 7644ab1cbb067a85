use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Kubernetes client configuration error: {0}")]
    KubeConfig(String),

    #[error(transparent)]
    Cloud(#[from] volsnap_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
