//! Access tokens for the Compute Engine API

use crate::error::{GceError, Result};
use async_trait::async_trait;
use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_auth::project::Config;
use google_cloud_auth::token::DefaultTokenSourceProvider;
use google_cloud_token::{TokenSource, TokenSourceProvider};
use std::sync::Arc;

const COMPUTE_SCOPE: &str = "https://www.googleapis.com/auth/compute";

/// Supplies the `Authorization` header value for API requests
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn authorization(&self) -> Result<String>;
}

/// Token source backed by a service-account key
pub struct ServiceAccountToken {
    inner: Arc<dyn TokenSource>,
}

impl ServiceAccountToken {
    /// Build from the contents of a service-account JSON key
    pub async fn from_json(json: &str) -> Result<Self> {
        let credentials: CredentialsFile = serde_json::from_str(json)?;
        let config = Config::default().with_scopes(&[COMPUTE_SCOPE]);

        let provider =
            DefaultTokenSourceProvider::new_with_credentials(config, Box::new(credentials))
                .await
                .map_err(|e| GceError::Auth(e.to_string()))?;

        Ok(Self {
            inner: provider.token_source(),
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountToken {
    async fn authorization(&self) -> Result<String> {
        // token() already carries the "Bearer" scheme
        self.inner
            .token()
            .await
            .map_err(|e| GceError::Auth(e.to_string()))
    }
}

/// Fixed bearer token (tests, pre-issued tokens)
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn authorization(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.token))
    }
}
