//! 시세 수집 파이프라인.
//!
//! 계열(`ExchangeFamily`)마다 독립된 하위 파이프라인이 있으며 동시에 실행해도 안전합니다.
//! 배치 결과는 도착하는 대로 캐시에 기록되므로 중간에 실패해도 앞선 진행분은 남습니다.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::StreamExt;
use ticker_core::{ExchangeFamily, Instrument};
use ticker_data::{home_currency_snapshot, map_price};

use crate::{Collector, IngestStats, Result};

/// 계열 하나의 수집 결과.
pub type FamilyResult = (ExchangeFamily, Result<IngestStats>);

/// 한 계열의 시세를 수집해 캐시에 기록합니다.
///
/// 상위 배치 실패는 기록 후 건너뛰고, 저장소 실패는 즉시 반환합니다.
pub async fn ingest_family(collector: &Collector, family: ExchangeFamily) -> Result<IngestStats> {
    let start = Instant::now();
    let mut stats = IngestStats::new(family);

    let mut instruments = Vec::new();
    for exchange in family.exchanges() {
        instruments.extend(collector.instruments().list_by_exchange(*exchange).await?);
    }
    stats.total = instruments.len();

    if family == ExchangeFamily::FxCommodity {
        write_home_currency(collector, &instruments).await?;
        stats.success += 1;
    }

    let Some(source) = collector.providers().price_source(family) else {
        tracing::warn!(family = %family, "시세 Provider가 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    };

    tracing::debug!(family = %family, provider = source.name(), count = instruments.len(), "시세 수집 시작");

    let mut batches = source.fetch_prices(&instruments);
    while let Some(batch) = batches.next().await {
        let matched = match batch.result {
            Ok(matched) => matched,
            Err(e) => {
                stats.failed_batches += 1;
                tracing::warn!(
                    family = %family,
                    batch = batch.index,
                    requested = batch.requested,
                    error = %e,
                    "시세 배치 실패, 다음 주기에 재시도"
                );
                continue;
            }
        };

        let observed_at = Utc::now();
        for item in matched {
            let snapshot = map_price(&item.raw, &item.instrument, observed_at);
            if !snapshot.is_valid() {
                stats.skipped += 1;
                tracing::debug!(family = %family, code = %snapshot.code, "last 가격 없음, 건너뜀");
                continue;
            }
            collector.prices().upsert(&snapshot).await?;
            stats.success += 1;
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 자국 통화 항등 시세 기록 (상위 피드와 무관).
async fn write_home_currency(collector: &Collector, instruments: &[Instrument]) -> Result<()> {
    let instrument = instruments
        .iter()
        .find(|instrument| instrument.is_home_currency())
        .cloned()
        .unwrap_or_else(Instrument::home_currency);

    collector
        .prices()
        .upsert(&home_currency_snapshot(&instrument, Utc::now()))
        .await?;
    Ok(())
}

/// 모든 계열을 각자의 태스크에서 동시에 수집합니다.
///
/// 한 계열의 실패나 panic은 다른 계열에 영향을 주지 않습니다.
pub async fn refresh_prices(collector: Arc<Collector>) -> Vec<FamilyResult> {
    let handles: Vec<_> = ExchangeFamily::ALL
        .into_iter()
        .map(|family| {
            let collector = Arc::clone(&collector);
            (
                family,
                tokio::spawn(async move { ingest_family(&collector, family).await }),
            )
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (family, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(stats) => stats.log_summary(),
            Err(e) => tracing::error!(
                family = %family,
                persistence = e.is_persistence(),
                error = %e,
                "시세 수집 실패"
            ),
        }
        results.push((family, result));
    }
    results
}

/// 지정한 계열만, 또는 전체 계열 수집 (CLI용).
pub async fn collect_prices(collector: Arc<Collector>, family: Option<ExchangeFamily>) -> Vec<FamilyResult> {
    match family {
        Some(family) => {
            let result = ingest_family(&collector, family).await;
            match &result {
                Ok(stats) => stats.log_summary(),
                Err(e) => tracing::error!(family = %family, error = %e, "시세 수집 실패"),
            }
            vec![(family, result)]
        }
        None => refresh_prices(collector).await,
    }
}
