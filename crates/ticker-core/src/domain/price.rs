//! 최신 시세 스냅샷.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Exchange, Instrument};

/// 종목 코드별 최신 시세 스냅샷.
///
/// 코드당 최대 한 행만 존재하며, 새 스냅샷은 이전 스냅샷을 완전히 대체합니다.
/// 상위 피드가 제공하지 않는 필드는 `None` 입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// 종목 코드 (전역 기본 키)
    pub code: String,
    pub name: String,
    pub exchange: Exchange,
    #[serde(rename = "icon")]
    pub icon_ref: String,
    /// 시가
    pub open: Option<f64>,
    /// 전일 종가
    pub close: Option<f64>,
    /// 고가
    pub high: Option<f64>,
    /// 저가
    pub low: Option<f64>,
    /// 현재가
    pub last: Option<f64>,
    /// 전일 대비 변동 (절대값)
    pub change_abs: Option<f64>,
    /// 전일 대비 변동률 (%)
    pub change_percent: Option<f64>,
    /// 거래대금
    pub turnover_value: Option<f64>,
    /// 거래량
    pub turnover_volume: Option<f64>,
    pub volatility: Option<f64>,
    /// 매수 호가
    pub bid: Option<f64>,
    /// 매도 호가
    pub ask: Option<f64>,
    /// 관측 시각
    pub observed_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// 종목 정보만 채운 빈 스냅샷을 생성합니다.
    pub fn empty(instrument: &Instrument, observed_at: DateTime<Utc>) -> Self {
        Self {
            code: instrument.code.clone(),
            name: instrument.name.clone(),
            exchange: instrument.exchange,
            icon_ref: instrument.icon_ref.clone(),
            open: None,
            close: None,
            high: None,
            low: None,
            last: None,
            change_abs: None,
            change_percent: None,
            turnover_value: None,
            turnover_volume: None,
            volatility: None,
            bid: None,
            ask: None,
            observed_at,
        }
    }

    /// 화면 표시에 쓸 수 있는 스냅샷인지 확인합니다 (`last` 필수).
    pub fn is_valid(&self) -> bool {
        self.last.is_some_and(f64::is_finite)
    }
}
