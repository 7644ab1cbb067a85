//! Kubernetes API へのアクセス
//!
//! Orchestrator が必要とするのは PV の一覧取得と Event の作成だけなので、
//! その二つを `Cluster` trait として切り出している。

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, PersistentVolume};
use kube::api::{ListParams, PostParams};
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};

#[async_trait]
pub trait Cluster: Send + Sync {
    /// 全 PersistentVolume を API の返却順で取得
    async fn list_persistent_volumes(&self) -> Result<Vec<PersistentVolume>>;

    /// `namespace` に Event を作成
    async fn create_event(&self, namespace: &str, event: &Event) -> Result<Event>;
}

/// kube-rs クライアントによる実装
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// in-cluster (ServiceAccount) または kubeconfig で接続
    pub async fn connect(in_cluster: bool) -> Result<Self> {
        let config = if in_cluster {
            tracing::debug!("Using in-cluster Kubernetes configuration");
            Config::incluster().map_err(|e| CoreError::KubeConfig(e.to_string()))?
        } else {
            tracing::debug!("Using local kubeconfig");
            Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .map_err(|e| CoreError::KubeConfig(e.to_string()))?
        };

        let client = Client::try_from(config)?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn list_persistent_volumes(&self) -> Result<Vec<PersistentVolume>> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn create_event(&self, namespace: &str, event: &Event) -> Result<Event> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.create(&PostParams::default(), event).await?)
    }
}
