//! スナップショットのライフサイクル管理
//!
//! 1 回の実行は二つの独立したフェーズからなる:
//!
//! - create phase: 対象 PV ごとにスナップショットを作成し Event を記録
//! - cleanup phase: 保持期間を過ぎたスナップショットを削除
//!
//! どちらも 1 件ずつ逐次処理する。1 件の失敗でバッチ全体は止めない。

use crate::cluster::Cluster;
use crate::error::Result;
use crate::events::EventReporter;
use crate::selector::list_eligible_volumes;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use volsnap_cloud::{SnapshotProvider, Volume};
use volsnap_config::RetentionDays;

/// 実行オプション (CLI フラグに対応)
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub create_snapshots: bool,
    pub clean_old_snapshots: bool,
    pub retention: RetentionDays,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            create_snapshots: true,
            clean_old_snapshots: true,
            retention: RetentionDays::default(),
            dry_run: false,
        }
    }
}

/// 実行結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 対象となった PV の数
    pub volumes: usize,
    pub created: usize,
    /// プロバイダーの管轄外だった PV
    pub skipped: usize,
    pub failed: usize,
    pub deleted: usize,
    pub delete_failed: usize,
    /// Event の送信に失敗した回数
    pub events_failed: usize,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.delete_failed > 0
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} volume(s): {} snapshot(s) created, {} skipped, {} failed; {} deleted, {} delete failure(s)",
            self.volumes, self.created, self.skipped, self.failed, self.deleted, self.delete_failed
        )?;
        if self.events_failed > 0 {
            write!(f, "; {} event(s) not recorded", self.events_failed)?;
        }
        Ok(())
    }
}

pub struct Orchestrator {
    cluster: Arc<dyn Cluster>,
    provider: Arc<dyn SnapshotProvider>,
    reporter: EventReporter,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(
        cluster: Arc<dyn Cluster>,
        provider: Arc<dyn SnapshotProvider>,
        reporter: EventReporter,
        options: RunOptions,
    ) -> Self {
        Self {
            cluster,
            provider,
            reporter,
            options,
        }
    }

    /// 両フェーズを実行し、フェーズ外に漏れたエラーを Event として記録する
    ///
    /// エラーは記録後そのまま返す。呼び出し側はこれを非ゼロ終了に変換する。
    pub async fn execute(&self) -> Result<RunReport> {
        match self.run().await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!("Snapshot run failed: {}", e);
                let mut ignored = RunReport::default();
                self.emit(None, &e.to_string(), &mut ignored).await;
                Err(e)
            }
        }
    }

    /// 両フェーズを実行する
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();

        if self.options.create_snapshots {
            self.create_phase(&mut report).await?;
        }

        if self.options.clean_old_snapshots {
            self.cleanup_phase(Utc::now(), &mut report).await?;
        }

        Ok(report)
    }

    async fn create_phase(&self, report: &mut RunReport) -> Result<()> {
        let volumes = list_eligible_volumes(self.cluster.as_ref()).await?;
        report.volumes = volumes.len();

        for volume in &volumes {
            match self
                .provider
                .create_snapshot(volume, self.options.dry_run)
                .await
            {
                Ok(Some(created)) => {
                    report.created += 1;
                    self.emit(Some(&created.volume), "", report).await;
                }
                Ok(None) => {
                    report.skipped += 1;
                    tracing::debug!("{} is not handled by {}", volume.name, self.provider.name());
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Snapshot of {} failed: {}", volume.name, e);
                    self.emit(Some(volume), &e.to_string(), report).await;
                }
            }
        }

        Ok(())
    }

    async fn cleanup_phase(&self, now: DateTime<Utc>, report: &mut RunReport) -> Result<()> {
        let cutoff = retention_cutoff(now, self.options.retention);
        tracing::info!(
            "--> Cleaning snapshots older than {}, before {}",
            self.options.retention,
            cutoff
        );

        for snapshot in self.provider.list_snapshots().await? {
            if !self.provider.expired_snapshot(&snapshot, cutoff) {
                continue;
            }

            match self
                .provider
                .delete_snapshot(&snapshot, self.options.dry_run)
                .await
            {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    report.delete_failed += 1;
                    tracing::warn!("Failed to delete snapshot {}: {}", snapshot.id, e);
                }
            }
        }

        Ok(())
    }

    /// Event 送信の失敗はバッチを止めない
    async fn emit(&self, volume: Option<&Volume>, error: &str, report: &mut RunReport) {
        if let Err(e) = self.reporter.report(volume, error).await {
            report.events_failed += 1;
            tracing::warn!("Failed to record event: {}", e);
        }
    }
}

/// `now - retention`; 表現できる範囲を下回る場合は最古の時刻
pub fn retention_cutoff(now: DateTime<Utc>, retention: RetentionDays) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(retention.days())))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
