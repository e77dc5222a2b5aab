//! HTTP API 서버. 수집 스케줄러를 같은 프로세스에서 실행합니다.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ticker_api::{create_router, ApiConfig, AppState};
use ticker_collector::{Collector, CollectorConfig, Scheduler};
use ticker_core::init_logging_from_env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging_from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("로깅 초기화 실패")?;

    info!("Starting Ticker API server...");

    let api_config = ApiConfig::from_env()?;
    let collector = Arc::new(Collector::from_config(CollectorConfig::from_env()?).await?);
    info!("데이터베이스 연결 및 스키마 준비 완료");

    let scheduler = Scheduler::new(Arc::clone(&collector)).start().await;

    let state = Arc::new(AppState::new(collector.database().clone()));
    let app = create_router(state);

    let addr = api_config.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("{} 바인드 실패", addr))?;
    info!(%addr, "API server listening");

    let shutdown_token = scheduler.token();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token))
        .await?;

    scheduler.stop().await;
    collector.database().close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Ctrl-C 또는 SIGTERM 대기. 스케줄러가 먼저 취소되어도 서버를 내립니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
        _ = shutdown_token.cancelled() => {}
    }
}
