mod provider;

use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use volsnap_config::{
    Credentials, DEFAULT_RETENTION_DAYS, RETENTION_DAYS_ENV, RetentionDays, RuntimeEnv,
    select_provider,
};
use volsnap_core::{EventReporter, KubeCluster, Orchestrator, RunOptions};

/// `--verbose` 時はこのワークスペースのクレートだけ debug にする
const VERBOSE_FILTER: &str = "info,volsnap=debug,volsnap_core=debug,volsnap_config=debug,volsnap_cloud=debug,volsnap_cloud_aws=debug,volsnap_cloud_gce=debug";

#[derive(Parser)]
#[command(name = "volsnap")]
#[command(version)]
#[command(about = "PersistentVolume のスナップショットを作成し、古いものを削除する", long_about = None)]
struct Cli {
    /// スナップショットを作成しない
    #[arg(long)]
    dont_create_snapshots: bool,

    /// スナップショットの保持日数 (不正な値はデフォルトに戻す)
    #[arg(long, env = RETENTION_DAYS_ENV, value_name = "DAYS", allow_hyphen_values = true)]
    retention_days: Option<String>,

    /// 保持期間を過ぎたスナップショットを削除しない
    #[arg(long)]
    dont_clean_old_snapshots: bool,

    /// クラウド側の作成・削除を行わずに流れだけを確認する
    #[arg(long)]
    dry_run: bool,

    /// デバッグログを出力
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new(VERBOSE_FILTER)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (retention, warning) =
        RetentionDays::parse_or_default(cli.retention_days.as_deref(), DEFAULT_RETENTION_DAYS);
    if let Some(warning) = warning {
        println!("{} {}", "Warning:".yellow().bold(), warning);
    }

    let options = RunOptions {
        create_snapshots: !cli.dont_create_snapshots,
        clean_old_snapshots: !cli.dont_clean_old_snapshots,
        retention,
        dry_run: cli.dry_run,
    };

    // クレデンシャルがなければクラスタにも触らずに終わる
    let Some(selection) = select_provider(&Credentials::from_env()) else {
        println!("--> Unable to detect provider");
        if options.dry_run {
            return Ok(());
        }
        std::process::exit(1);
    };
    println!("--> Detected provider {}", selection.name().cyan());
    if options.dry_run {
        println!("{}", "--> Dry run: no snapshot will be created or deleted".yellow());
    }

    let provider = match provider::build_provider(&selection).await {
        Ok(provider) => provider,
        Err(e) => exit_with_error(&e),
    };
    println!("--> Using {}", provider.display_name().cyan());

    let env = RuntimeEnv::from_env();
    let cluster = match KubeCluster::connect(env.in_cluster).await {
        Ok(cluster) => Arc::new(cluster),
        Err(e) => exit_with_error(&anyhow::Error::from(e)),
    };

    println!("--> Started {}", chrono::Utc::now().to_rfc3339());

    let reporter = EventReporter::new(cluster.clone(), env);
    let orchestrator = Orchestrator::new(cluster, provider, reporter, options);

    match orchestrator.execute().await {
        Ok(report) => {
            let status = if report.has_failures() {
                "--> Finished with failures".yellow().bold()
            } else {
                "--> Finished".green().bold()
            };
            println!("{} {}", status, report);
            Ok(())
        }
        Err(e) => exit_with_error(&anyhow::Error::from(e)),
    }
}

fn exit_with_error(error: &anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), error);
    std::process::exit(1);
}
