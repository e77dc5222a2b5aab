//! 수집 통계 구조체.

use std::time::Duration;
use ticker_core::ExchangeFamily;

/// 레지스트리 동기화 통계 (거래소 단위)
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    /// 시도한 거래소 수
    pub total: usize,
    /// 교체에 성공한 거래소 수
    pub success: usize,
    /// 실패한 거래소 수
    pub errors: usize,
    /// staleness 기간 내라서 건너뛴 거래소 수
    pub skipped: usize,
    /// 저장된 총 종목 수
    pub instruments: usize,
    /// 소요 시간
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            instruments = self.instruments,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );
    }
}

/// 시세 수집 통계 (계열 단위, 참고용)
#[derive(Debug, Clone)]
pub struct IngestStats {
    pub family: ExchangeFamily,
    /// 레지스트리의 대상 종목 수
    pub total: usize,
    /// 캐시에 기록된 스냅샷 수
    pub success: usize,
    /// 실패한 상위 요청(배치) 수
    pub failed_batches: usize,
    /// `last`가 없어 건너뛴 스냅샷 수
    pub skipped: usize,
    pub elapsed: Duration,
}

impl IngestStats {
    pub fn new(family: ExchangeFamily) -> Self {
        Self {
            family,
            total: 0,
            success: 0,
            failed_batches: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            family = %self.family,
            total = self.total,
            success = self.success,
            failed_batches = self.failed_batches,
            skipped = self.skipped,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "시세 캐시 갱신 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut stats = CollectionStats::new();
        assert_eq!(stats.success_rate(), 0.0);

        stats.total = 4;
        stats.success = 3;
        assert_eq!(stats.success_rate(), 75.0);
    }
}
