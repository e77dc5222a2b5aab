//! 거래소 및 수집 계열 정의.
//!
//! - `Exchange` - 종목이 속한 거래소 (국내 주식, 암호화폐, 외환, 원자재)
//! - `ExchangeFamily` - 하나의 상위 시세 피드가 담당하는 거래소 묶음

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 거래소 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exchange {
    /// 국내 주식 시장 (BIST)
    Equity,
    /// 암호화폐 거래소 (Binance)
    Crypto,
    /// 외환 (통화)
    Fx,
    /// 원자재 (금, 은, 백금 등)
    Commodity,
}

impl Exchange {
    /// 모든 거래소 (레지스트리 동기화 순서).
    pub const ALL: [Exchange; 4] = [
        Exchange::Equity,
        Exchange::Crypto,
        Exchange::Fx,
        Exchange::Commodity,
    ];

    /// 저장소에 기록되는 문자열 코드.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Equity => "EQUITY",
            Exchange::Crypto => "CRYPTO",
            Exchange::Fx => "FX",
            Exchange::Commodity => "COMMODITY",
        }
    }

    /// 이 거래소의 시세를 수집하는 계열.
    pub fn family(&self) -> ExchangeFamily {
        match self {
            Exchange::Equity => ExchangeFamily::Equity,
            Exchange::Crypto => ExchangeFamily::Crypto,
            Exchange::Fx | Exchange::Commodity => ExchangeFamily::FxCommodity,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = CoreError;

    /// 대소문자를 구분하지 않으며 기존 상위 이름(BIST, BINANCE, DOVIZ, EMTIA)도 허용합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EQUITY" | "EQUITY_LOCAL" | "BIST" => Ok(Exchange::Equity),
            "CRYPTO" | "BINANCE" => Ok(Exchange::Crypto),
            "FX" | "DOVIZ" => Ok(Exchange::Fx),
            "COMMODITY" | "EMTIA" => Ok(Exchange::Commodity),
            _ => Err(CoreError::UnknownExchange(s.to_string())),
        }
    }
}

/// 수집 계열.
///
/// 하나의 계열은 하나의 시세 파이프라인에 대응하며, 계열끼리는 서로 독립적으로
/// 동시에 실행될 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeFamily {
    /// 국내 주식
    Equity,
    /// 암호화폐
    Crypto,
    /// 외환 + 원자재 (같은 상위 피드 사용)
    FxCommodity,
}

impl ExchangeFamily {
    /// 모든 계열.
    pub const ALL: [ExchangeFamily; 3] = [
        ExchangeFamily::Equity,
        ExchangeFamily::Crypto,
        ExchangeFamily::FxCommodity,
    ];

    /// 계열에 속한 거래소 목록.
    pub fn exchanges(&self) -> &'static [Exchange] {
        match self {
            ExchangeFamily::Equity => &[Exchange::Equity],
            ExchangeFamily::Crypto => &[Exchange::Crypto],
            ExchangeFamily::FxCommodity => &[Exchange::Fx, Exchange::Commodity],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeFamily::Equity => "equity",
            ExchangeFamily::Crypto => "crypto",
            ExchangeFamily::FxCommodity => "fx_commodity",
        }
    }
}

impl fmt::Display for ExchangeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeFamily {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "equity" => Ok(ExchangeFamily::Equity),
            "crypto" => Ok(ExchangeFamily::Crypto),
            "fx_commodity" | "fx" | "commodity" => Ok(ExchangeFamily::FxCommodity),
            _ => Err(CoreError::UnknownFamily(s.to_string())),
        }
    }
}
