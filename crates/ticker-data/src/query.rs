//! 읽기 전용 조회 API.
//!
//! HTTP 계층은 이 타입만 사용합니다. 캐시에 스냅샷이 없으면 `None`
//! ("아직 준비되지 않음")을 반환합니다.

use ticker_core::{Exchange, Instrument, PriceSnapshot};
use tracing::debug;

use crate::error::Result;
use crate::storage::{Database, InstrumentRepository, PriceCache};

/// 시세/종목 조회.
#[derive(Clone)]
pub struct PriceQuery {
    prices: PriceCache,
    instruments: InstrumentRepository,
}

impl PriceQuery {
    pub fn new(db: Database) -> Self {
        Self {
            prices: PriceCache::new(db.clone()),
            instruments: InstrumentRepository::new(db),
        }
    }

    /// 코드(대소문자 무시)의 최신 시세.
    pub async fn get_cached_price(&self, code: &str) -> Result<Option<PriceSnapshot>> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Ok(None);
        }
        self.prices.get(&code).await
    }

    /// 종목 검색.
    ///
    /// `exchange`는 대소문자를 무시하고 정확히 일치해야 하며 예전 거래소 이름도 받습니다.
    /// 알 수 없는 거래소는 빈 목록입니다.
    pub async fn list_instruments(&self, exchange: Option<&str>, query: Option<&str>) -> Result<Vec<Instrument>> {
        let exchange = match exchange.map(str::trim).filter(|e| !e.is_empty()) {
            Some(name) => match name.parse::<Exchange>() {
                Ok(exchange) => Some(exchange),
                Err(_) => {
                    debug!(exchange = %name, "알 수 없는 거래소 필터");
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        self.instruments.list(exchange, query).await
    }
}
