//! Cloud credential detection and provider selection

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// AWS access key pair found in the environment
///
/// Only the key id is kept. The SDK reads the secret and region from the
/// environment itself when the provider is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
}

/// Google service-account key path plus target zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GceCredentials {
    pub credentials_path: PathBuf,
    pub zone: String,
}

/// Parsed service-account key
#[derive(Clone)]
pub struct GceServiceAccount {
    pub project_id: String,
    pub zone: String,
    /// Raw key JSON, handed to the token source
    pub json: String,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    project_id: Option<String>,
}

impl GceCredentials {
    /// Read the key file and extract `project_id`
    pub fn load(&self) -> Result<GceServiceAccount> {
        let json = std::fs::read_to_string(&self.credentials_path).map_err(|source| {
            ConfigError::CredentialsRead {
                path: self.credentials_path.clone(),
                source,
            }
        })?;

        let key: ServiceAccountKey =
            serde_json::from_str(&json).map_err(|source| ConfigError::CredentialsParse {
                path: self.credentials_path.clone(),
                source,
            })?;

        let project_id = key
            .project_id
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConfigError::MissingProjectId(self.credentials_path.clone()))?;

        tracing::debug!("Loaded GCE credentials for project {}", project_id);

        Ok(GceServiceAccount {
            project_id,
            zone: self.zone.clone(),
            json,
        })
    }
}

/// Every credential set present in the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub aws: Option<AwsCredentials>,
    pub gce: Option<GceCredentials>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Detect credentials through an arbitrary variable lookup
    ///
    /// Variables that are set but empty count as absent.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let aws = match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(_secret)) => Some(AwsCredentials { access_key_id }),
            _ => None,
        };

        let gce = match (get("GOOGLE_APPLICATION_CREDENTIALS"), get("GOOGLE_ZONE")) {
            (Some(path), Some(zone)) => Some(GceCredentials {
                credentials_path: PathBuf::from(path),
                zone,
            }),
            _ => None,
        };

        Self { aws, gce }
    }
}

/// The one provider a run talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    Aws(AwsCredentials),
    Gce(GceCredentials),
}

impl ProviderSelection {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderSelection::Aws(_) => "AWS",
            ProviderSelection::Gce(_) => "GCE",
        }
    }
}

/// Pick the active provider; AWS wins when both are configured
pub fn select_provider(credentials: &Credentials) -> Option<ProviderSelection> {
    if let Some(aws) = &credentials.aws {
        return Some(ProviderSelection::Aws(aws.clone()));
    }
    credentials.gce.clone().map(ProviderSelection::Gce)
}
