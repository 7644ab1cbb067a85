use std::sync::Arc;
use volsnap_cloud::SnapshotProvider;
use volsnap_cloud_aws::AwsProvider;
use volsnap_cloud_gce::GceProvider;
use volsnap_config::ProviderSelection;

/// 選択されたプロバイダーの実体を構築
///
/// GCE はここでクレデンシャルファイルを読むため、壊れたファイルは起動エラーになる。
pub async fn build_provider(selection: &ProviderSelection) -> anyhow::Result<Arc<dyn SnapshotProvider>> {
    match selection {
        ProviderSelection::Aws(credentials) => {
            tracing::debug!("Using AWS access key {}", credentials.access_key_id);
            Ok(Arc::new(AwsProvider::from_env().await))
        }
        ProviderSelection::Gce(credentials) => {
            let account = credentials.load()?;
            let provider = GceProvider::new(&account.project_id, &account.zone, &account.json).await?;
            tracing::debug!(
                "Using GCE project {} in zone {}",
                account.project_id,
                account.zone
            );
            Ok(Arc::new(provider))
        }
    }
}
