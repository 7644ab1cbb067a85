//! Compute Engine API client
//!
//! Direct REST implementation of the three snapshot calls volsnap needs.

use crate::auth::AccessTokenSource;
use crate::error::{GceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// Compute Engine snapshot client for one project/zone
pub struct ComputeClient {
    client: reqwest::Client,
    base_url: String,
    project: String,
    zone: String,
    token: Arc<dyn AccessTokenSource>,
}

impl ComputeClient {
    pub fn new(
        base_url: impl Into<String>,
        project: impl Into<String>,
        zone: impl Into<String>,
        token: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: project.into(),
            zone: zone.into(),
            token,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Start a snapshot of a zonal disk
    pub async fn create_disk_snapshot(
        &self,
        disk: &str,
        snapshot_name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<Operation> {
        let url = format!(
            "{}/projects/{}/zones/{}/disks/{}/createSnapshot",
            self.base_url, self.project, self.zone, disk
        );

        let request_body = CreateSnapshotRequest {
            name: snapshot_name.to_string(),
            labels,
        };

        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.token.authorization().await?)
            .json(&request_body)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// List global snapshots matching `filter`, following pagination
    pub async fn list_snapshots(&self, filter: &str) -> Result<Vec<ApiSnapshot>> {
        let url = format!("{}/projects/{}/global/snapshots", self.base_url, self.project);

        let mut snapshots = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("filter", filter.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            tracing::debug!("GET {}", url);

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.token.authorization().await?)
                .query(&query)
                .send()
                .await?;

            let page: SnapshotList = check(response).await?.json().await?;
            snapshots.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(snapshots)
    }

    /// Delete a global snapshot by name
    pub async fn delete_snapshot(&self, snapshot_name: &str) -> Result<Operation> {
        let url = format!(
            "{}/projects/{}/global/snapshots/{}",
            self.base_url, self.project, snapshot_name
        );

        tracing::debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.token.authorization().await?)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}

/// Turn a non-2xx response into `GceError::Api` with Google's message
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    Err(GceError::Api {
        status: status.as_u16(),
        message,
    })
}

// ============ API Types ============

#[derive(Debug, Serialize)]
struct CreateSnapshotRequest {
    name: String,
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotList {
    #[serde(default)]
    items: Vec<ApiSnapshot>,
    next_page_token: Option<String>,
}

/// Snapshot resource as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnapshot {
    pub name: String,
    /// 欠けていれば空文字 (一覧側で警告してスキップ)
    #[serde(default)]
    pub creation_timestamp: String,
    pub source_disk: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ApiSnapshot {
    /// Disk name from the `sourceDisk` URL
    pub fn source_disk_name(&self) -> Option<&str> {
        self.source_disk
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// Long-running operation handle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    pub status: Option<String>,
    pub target_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[allow(dead_code)]
    code: Option<u16>,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_disk_name() {
        let snapshot: ApiSnapshot = serde_json::from_value(serde_json::json!({
            "name": "pd-1-20240101000000",
            "creationTimestamp": "2024-01-01T00:00:00.000-08:00",
            "sourceDisk": "https://www.googleapis.com/compute/v1/projects/p/zones/z/disks/pd-1"
        }))
        .unwrap();

        assert_eq!(snapshot.source_disk_name(), Some("pd-1"));
        assert!(snapshot.labels.is_empty());
    }

    #[test]
    fn test_snapshot_list_without_items() {
        let list: SnapshotList = serde_json::from_str(r#"{"kind":"compute#snapshotList"}"#).unwrap();
        assert!(list.items.is_empty());
        assert!(list.next_page_token.is_none());
    }
}
