//! 종목 정의.

use serde::{Deserialize, Serialize};

use super::Exchange;

/// 자국 통화 코드. 상위 피드는 자기 자신에 대한 시세를 주지 않습니다.
pub const HOME_CURRENCY_CODE: &str = "TRY";

/// 자국 통화 표시 이름.
pub const HOME_CURRENCY_NAME: &str = "Türk Lirası";

/// 자국 통화 아이콘.
pub const HOME_CURRENCY_ICON: &str = "https://flagcdn.com/w40/tr.png";

/// 시세를 조회할 수 있는 종목 (주식, 암호화폐, 통화, 원자재).
///
/// 식별자는 `(exchange, code)` 입니다. 레지스트리 동기화 시 거래소 단위로
/// 통째로 교체되며, 동기화 사이에 부분 수정되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목 코드 (예: AKBNK, BTC, USD, GRA)
    pub code: String,
    /// 표시 이름
    pub name: String,
    /// 거래소
    pub exchange: Exchange,
    /// 종목 유형 (Stock, CryptoCurrency, Currency, Gold ...)
    #[serde(rename = "type")]
    pub instrument_type: String,
    /// 아이콘 URL 또는 경로
    #[serde(rename = "icon")]
    pub icon_ref: String,
}

impl Instrument {
    /// 새 종목을 생성합니다.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        exchange: Exchange,
        instrument_type: impl Into<String>,
        icon_ref: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            exchange,
            instrument_type: instrument_type.into(),
            icon_ref: icon_ref.into(),
        }
    }

    /// 내장 자국 통화 종목.
    pub fn home_currency() -> Self {
        Self::new(
            HOME_CURRENCY_CODE,
            HOME_CURRENCY_NAME,
            Exchange::Fx,
            "Currency",
            HOME_CURRENCY_ICON,
        )
    }

    /// 자국 통화 여부.
    pub fn is_home_currency(&self) -> bool {
        self.exchange == Exchange::Fx && self.code == HOME_CURRENCY_CODE
    }

    /// 이름 또는 코드에 검색어가 포함되는지 확인합니다 (대소문자 무시).
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.code.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_currency() {
        let try_ = Instrument::home_currency();
        assert!(try_.is_home_currency());
        assert_eq!(try_.exchange, Exchange::Fx);

        let usd = Instrument::new("USD", "ABD Doları", Exchange::Fx, "Currency", "");
        assert!(!usd.is_home_currency());
    }

    #[test]
    fn test_matches_query() {
        let akbnk = Instrument::new("AKBNK", "AKBANK", Exchange::Equity, "Stock", "");
        assert!(akbnk.matches_query("akb"));
        assert!(akbnk.matches_query("BANK"));
        assert!(akbnk.matches_query(""));
        assert!(!akbnk.matches_query("garan"));
    }

    #[test]
    fn test_serde_field_names() {
        let inst = Instrument::new("BTC", "BTC / TRY", Exchange::Crypto, "CryptoCurrency", "x.svg");
        let value = serde_json::to_value(&inst).unwrap();
        assert_eq!(value["type"], "CryptoCurrency");
        assert_eq!(value["icon"], "x.svg");
        assert_eq!(value["exchange"], "CRYPTO");
    }
}
