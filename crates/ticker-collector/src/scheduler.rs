//! 레지스트리 동기화와 시세 갱신 스케줄러.
//!
//! - 시작 시 모든 거래소 레지스트리를 한 번 동기화 (완료까지 대기)
//! - 매일 설정된 시각에 레지스트리 재동기화 (staleness 검사 적용)
//! - 짧은 대기 후 일정 주기로 모든 계열의 시세 갱신
//!
//! 각 타이머는 루트 토큰의 자식 `CancellationToken`을 가지며 [`SchedulerHandle::stop`]으로
//! 함께 취소됩니다.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::modules::{refresh_prices, sync_all_registries, FamilyResult, RegistrySyncReport};
use crate::Collector;

/// 시세 갱신 한 번의 결과.
#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(Vec<FamilyResult>),
    /// 이전 갱신이 아직 실행 중이라 이번 주기를 건너뜀
    Skipped,
}

impl RefreshOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// 스케줄러.
#[derive(Clone)]
pub struct Scheduler {
    collector: Arc<Collector>,
    refresh_guard: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(collector: Arc<Collector>) -> Self {
        Self {
            collector,
            refresh_guard: Arc::new(Mutex::new(())),
        }
    }

    /// 시세 갱신 한 번 실행. 이미 실행 중이면 대기하지 않고 건너뜁니다.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let Ok(_guard) = self.refresh_guard.try_lock() else {
            warn!("이전 시세 갱신이 아직 실행 중, 이번 주기 건너뜀");
            return RefreshOutcome::Skipped;
        };

        RefreshOutcome::Completed(refresh_prices(Arc::clone(&self.collector)).await)
    }

    /// 모든 거래소 레지스트리 동기화. panic은 태스크 경계에서 기록만 합니다.
    pub async fn sync_registries(&self) -> Option<RegistrySyncReport> {
        let collector = Arc::clone(&self.collector);
        let handle = tokio::spawn(async move { sync_all_registries(&collector, false).await });

        match handle.await {
            Ok(report) => {
                report.stats.log_summary("레지스트리 동기화");
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "레지스트리 동기화 태스크 실패");
                None
            }
        }
    }

    /// 스케줄러를 시작합니다.
    ///
    /// 시작 동기화가 끝난 뒤에 타이머들이 등록됩니다.
    pub async fn start(self) -> SchedulerHandle {
        info!("스케줄러 시작: 초기 레지스트리 동기화");
        self.sync_registries().await;

        let root = CancellationToken::new();
        let tasks = vec![
            tokio::spawn(run_daily_registry_loop(self.clone(), root.child_token())),
            tokio::spawn(run_price_loop(self, root.child_token())),
        ];

        SchedulerHandle { root, tasks }
    }
}

/// 실행 중인 스케줄러 핸들.
pub struct SchedulerHandle {
    root: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// 외부 종료 신호와 연결할 수 있는 토큰.
    pub fn token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// 모든 타이머를 취소하고 태스크 종료를 기다립니다.
    pub async fn stop(self) {
        info!("스케줄러 종료 중...");
        self.root.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "스케줄러 태스크 종료 실패");
            }
        }
        info!("스케줄러 종료됨");
    }
}

async fn run_daily_registry_loop(scheduler: Scheduler, token: CancellationToken) {
    let config = scheduler.collector.config().scheduler.clone();

    loop {
        let now = Utc::now();
        let next = config.next_daily_sync(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, "다음 레지스트리 동기화 예약");

        tokio::select! {
            _ = sleep(wait) => {
                scheduler.sync_registries().await;
            }
            _ = token.cancelled() => {
                info!("레지스트리 타이머: 종료 시그널 수신");
                break;
            }
        }
    }
}

async fn run_price_loop(scheduler: Scheduler, token: CancellationToken) {
    let config = scheduler.collector.config().scheduler.clone();
    info!(
        interval_ms = config.price_refresh_interval_ms,
        warmup_ms = config.warmup_ms,
        "시세 갱신 타이머 시작"
    );

    tokio::select! {
        _ = sleep(config.warmup()) => {}
        _ = token.cancelled() => {
            info!("시세 타이머: 종료 시그널 수신 (대기 중)");
            return;
        }
    }

    let mut ticker = interval(config.price_refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                in_flight.retain(|handle| !handle.is_finished());
                let scheduler = scheduler.clone();
                // 갱신은 별도 태스크에서 실행되어 다음 tick이 겹치면 건너뛰게 됩니다.
                in_flight.push(tokio::spawn(async move {
                    scheduler.refresh_once().await;
                }));
            }
            _ = token.cancelled() => {
                info!("시세 타이머: 종료 시그널 수신, 실행 중인 갱신 대기");
                break;
            }
        }
    }

    for handle in in_flight {
        if let Err(e) = handle.await {
            error!(error = %e, "시세 갱신 태스크 실패");
        }
    }
}
