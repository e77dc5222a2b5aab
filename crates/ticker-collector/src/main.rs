//! 수집기 CLI.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ticker_collector::{modules, Collector, CollectorConfig, Scheduler};
use ticker_core::{init_logging, Exchange, ExchangeFamily, LogConfig, LogFormat};

#[derive(Parser)]
#[command(name = "ticker-collector")]
#[command(about = "Instrument registry and price collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// 종목 레지스트리 동기화
    SyncRegistry {
        /// 특정 거래소만 (EQUITY, CRYPTO, FX, COMMODITY)
        #[arg(long)]
        exchange: Option<Exchange>,

        /// staleness 검사 무시
        #[arg(long)]
        force: bool,
    },

    /// 시세 수집 한 번 실행
    CollectPrices {
        /// 특정 계열만 (equity, crypto, fx_commodity)
        #[arg(long)]
        family: Option<ExchangeFamily>,
    },

    /// 전체 워크플로우 실행 (레지스트리 동기화 → 시세 수집)
    RunAll,

    /// 데몬 모드: Ctrl-C까지 스케줄러 실행
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::new(format!(
        "ticker_collector={0},ticker_data={0}",
        cli.log_level
    ))
    .with_format(cli.log_format);
    init_logging(log_config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("로깅 초기화 실패")?;

    tracing::info!("Ticker Collector 시작");

    let config = CollectorConfig::from_env()?;
    tracing::debug!(database_url = %config.database_url, "설정 로드 완료");

    let collector = Arc::new(Collector::from_config(config).await?);
    tracing::info!("데이터베이스 연결 성공");

    match cli.command {
        Commands::SyncRegistry { exchange, force } => match exchange {
            Some(exchange) => {
                let outcome = if force {
                    modules::force_sync_registry(&collector, exchange).await
                } else {
                    modules::sync_registry(&collector, exchange).await
                };
                tracing::info!(exchange = %exchange, outcome = ?outcome, "레지스트리 동기화 결과");
            }
            None => {
                let report = modules::sync_all_registries(&collector, force).await;
                report.stats.log_summary("레지스트리 동기화");
            }
        },
        Commands::CollectPrices { family } => {
            modules::collect_prices(Arc::clone(&collector), family).await;
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");

            tracing::info!("Step 1/2: 레지스트리 동기화");
            let report = modules::sync_all_registries(&collector, false).await;
            report.stats.log_summary("레지스트리 동기화");

            tracing::info!("Step 2/2: 시세 수집");
            modules::refresh_prices(Arc::clone(&collector)).await;

            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
        Commands::Daemon => {
            tracing::info!("=== 데몬 모드 시작 ===");
            let handle = Scheduler::new(Arc::clone(&collector)).start().await;

            tokio::signal::ctrl_c().await.context("종료 신호 대기 실패")?;
            tracing::info!("종료 신호 수신, 데몬 종료 중...");
            handle.stop().await;
        }
    }

    collector.database().close().await;
    tracing::info!("Ticker Collector 종료");

    Ok(())
}
