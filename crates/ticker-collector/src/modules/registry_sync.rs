//! 종목 레지스트리 동기화 모듈.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ticker_core::{Exchange, Instrument};
use ticker_data::map_instrument;

use crate::{CollectionStats, Collector};

/// 거래소 하나의 동기화 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// staleness 기간 내 (네트워크 호출 없음)
    Skipped { last_synced_at: DateTime<Utc> },
    /// 종목 집합 교체 완료
    Synced { count: usize },
    /// 상위 장애, 너무 작은 목록, 저장 실패. 이전 집합과 동기화 상태는 그대로입니다.
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// 전체 거래소 동기화 결과.
#[derive(Debug, Clone)]
pub struct RegistrySyncReport {
    pub outcomes: Vec<(Exchange, SyncOutcome)>,
    pub stats: CollectionStats,
}

impl RegistrySyncReport {
    pub fn outcome(&self, exchange: Exchange) -> Option<&SyncOutcome> {
        self.outcomes
            .iter()
            .find(|(e, _)| *e == exchange)
            .map(|(_, outcome)| outcome)
    }
}

/// 거래소 종목 레지스트리 동기화 (staleness 검사 적용).
pub async fn sync_registry(collector: &Collector, exchange: Exchange) -> SyncOutcome {
    sync_registry_with(collector, exchange, false).await
}

/// staleness 검사 없이 동기화 (운영자 수동 실행용).
pub async fn force_sync_registry(collector: &Collector, exchange: Exchange) -> SyncOutcome {
    sync_registry_with(collector, exchange, true).await
}

/// 모든 거래소를 순서대로 동기화합니다.
pub async fn sync_all_registries(collector: &Collector, force: bool) -> RegistrySyncReport {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    let mut outcomes = Vec::with_capacity(Exchange::ALL.len());

    tracing::info!(force, "레지스트리 동기화 시작");

    for exchange in Exchange::ALL {
        let outcome = sync_registry_with(collector, exchange, force).await;
        stats.total += 1;
        match &outcome {
            SyncOutcome::Synced { count } => {
                stats.success += 1;
                stats.instruments += count;
            }
            SyncOutcome::Skipped { .. } => stats.skipped += 1,
            SyncOutcome::Failed { .. } => stats.errors += 1,
        }
        outcomes.push((exchange, outcome));
    }

    stats.elapsed = start.elapsed();
    RegistrySyncReport { outcomes, stats }
}

async fn sync_registry_with(collector: &Collector, exchange: Exchange, force: bool) -> SyncOutcome {
    let config = &collector.config().registry;

    // 1. staleness 검사
    if !force && config.is_gated(exchange) {
        match collector.sync_state().get(exchange).await {
            Ok(Some(state)) if state.is_fresh(Utc::now(), config.staleness()) => {
                tracing::info!(
                    exchange = %exchange,
                    last_synced_at = %state.last_synced_at,
                    "최근에 동기화됨, 건너뛰기"
                );
                return SyncOutcome::Skipped {
                    last_synced_at: state.last_synced_at,
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(exchange = %exchange, error = %e, "동기화 상태 조회 실패");
                return SyncOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }
    }

    let Some(source) = collector.providers().instrument_source(exchange) else {
        tracing::warn!(exchange = %exchange, "종목 Provider가 없습니다");
        return SyncOutcome::Failed {
            reason: format!("no instrument source for {}", exchange),
        };
    };

    // 2. 상위 목록 조회
    tracing::info!(exchange = %exchange, provider = source.name(), "종목 목록 조회");
    let items = match source.list_instruments(exchange).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(exchange = %exchange, error = %e, "종목 목록 조회 실패, 이전 목록 유지");
            return SyncOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    let instruments = dedupe(
        items
            .iter()
            .map(|item| map_instrument(item, exchange))
            .filter(|instrument| !instrument.code.is_empty()),
    );

    // 3. 빈 목록은 상위 장애로 간주
    if instruments.len() < config.min_instrument_count {
        tracing::error!(
            exchange = %exchange,
            count = instruments.len(),
            min = config.min_instrument_count,
            "종목 수 부족, 이전 목록 유지"
        );
        return SyncOutcome::Failed {
            reason: format!(
                "listing has {} instruments, expected at least {}",
                instruments.len(),
                config.min_instrument_count
            ),
        };
    }

    // 4. 교체와 동기화 시각 기록 (단일 트랜잭션)
    match collector
        .instruments()
        .replace_exchange(exchange, &instruments, Utc::now())
        .await
    {
        Ok(count) => {
            tracing::info!(exchange = %exchange, count, "종목 레지스트리 교체 완료");
            SyncOutcome::Synced { count }
        }
        Err(e) => {
            tracing::error!(exchange = %exchange, error = %e, "종목 레지스트리 저장 실패");
            SyncOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// 같은 코드는 첫 항목만 남깁니다.
fn dedupe(instruments: impl Iterator<Item = Instrument>) -> Vec<Instrument> {
    let mut seen = HashSet::new();
    instruments
        .filter(|instrument| seen.insert(instrument.code.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first() {
        let list = vec![
            Instrument::new("AAA", "first", Exchange::Equity, "Stock", ""),
            Instrument::new("BBB", "b", Exchange::Equity, "Stock", ""),
            Instrument::new("AAA", "second", Exchange::Equity, "Stock", ""),
        ];
        let deduped = dedupe(list.into_iter());
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, "first");
    }
}
