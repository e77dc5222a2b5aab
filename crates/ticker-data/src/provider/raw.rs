//! 상위 API 원본 응답 항목.
//!
//! 숫자 필드는 관대하게 역직렬화합니다. JSON 숫자, 숫자 문자열(천 단위 쉼표 허용),
//! null을 받아들이고 그 외 값은 `None`이 됩니다. 필드 하나가 잘못되어도 항목 전체가
//! 거부되지 않습니다.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 레지스트리 동기화용 원본 종목 항목.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInstrumentItem {
    /// 국내 주식 목록 항목
    EquityStock(EquityListItem),
    /// 암호화폐 거래쌍
    CryptoPair(CryptoSymbolItem),
    /// 통화
    Currency(CurrencyListItem),
    /// 원자재 (정적 원자재 표에서 정의)
    Commodity(CommodityListItem),
    /// 내장 자국 통화
    HomeCurrency,
}

/// 시세 수집용 원본 시세 항목.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPriceItem {
    EquityStats(EquityStatsItem),
    CryptoTicker(CryptoTickerItem),
    FxQuote(FxQuoteItem),
    /// 자국 통화 항등 시세 (상위 피드 없음)
    HomeCurrency,
}

/// 국내 주식 목록 응답 항목 (`kod`, `ad`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EquityListItem {
    #[serde(rename = "kod")]
    pub code: String,
    #[serde(rename = "ad")]
    pub name: String,
}

/// 암호화폐 거래소 `exchangeInfo` 심볼 항목.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSymbolItem {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyListItem {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommodityListItem {
    pub code: String,
    pub name: String,
    pub commodity_type: String,
    pub icon: String,
}

/// 국내 주식 시세 통계 응답 항목.
///
/// `daily_change`는 비율(0.05 = 5%)로 제공됩니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityStatsItem {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub day_open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub day_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub day_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latest_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub daily_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
}

/// 암호화폐 24시간 티커 항목. 숫자는 문자열로 옵니다.
///
/// `price_change_percent`는 이미 퍼센트 단위입니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoTickerItem {
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub open_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub prev_close_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quote_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bid_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ask_price: Option<f64>,
}

/// 외환/원자재 시세 항목. `change`는 퍼센트 단위입니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FxQuoteItem {
    #[serde(rename = "Type", default)]
    pub item_type: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Buying", default, deserialize_with = "lenient_f64")]
    pub buying: Option<f64>,
    #[serde(rename = "Selling", default, deserialize_with = "lenient_f64")]
    pub selling: Option<f64>,
    #[serde(rename = "Change", default, deserialize_with = "lenient_f64")]
    pub change: Option<f64>,
    #[serde(rename = "Yuksek", default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(rename = "Dusuk", default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
}

/// 관대한 숫자 역직렬화.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// JSON 값에서 유한한 숫자를 추출합니다.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// 숫자 문자열 파싱 (빈 값과 "-"는 없음).
///
/// 쉼표는 올바른 천 단위 구분자일 때만 허용합니다. 소수점 쉼표("34,5")는 `None` 입니다.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    if !s.contains(',') {
        return s.parse().ok();
    }

    let (integer, fraction) = match s.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (s, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let unsigned = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    let mut groups = unsigned.split(',');
    let head = groups.next()?;
    let is_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    if head.is_empty() || head.len() > 3 || !is_digits(head) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && is_digits(g)) {
        return None;
    }

    s.replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_from_value() {
        assert_eq!(number_from_value(&json!(10.5)), Some(10.5));
        assert_eq!(number_from_value(&json!("1,234.5")), Some(1234.5));
        assert_eq!(number_from_value(&json!(" 42 ")), Some(42.0));
        assert_eq!(number_from_value(&json!("-")), None);
        assert_eq!(number_from_value(&json!("")), None);
        assert_eq!(number_from_value(&json!("abc")), None);
        assert_eq!(number_from_value(&json!(null)), None);
        assert_eq!(number_from_value(&json!({"a": 1})), None);
        assert_eq!(number_from_value(&json!("NaN")), None);
    }

    #[test]
    fn test_comma_only_as_thousands_separator() {
        assert_eq!(number_from_value(&json!("1,234")), Some(1234.0));
        assert_eq!(number_from_value(&json!("-12,345,678.25")), Some(-12_345_678.25));
        assert_eq!(number_from_value(&json!("34,5012")), None);
        assert_eq!(number_from_value(&json!("34,5")), None);
        assert_eq!(number_from_value(&json!("1,23")), None);
        assert_eq!(number_from_value(&json!(",123")), None);
        assert_eq!(number_from_value(&json!("1234,567")), None);
        assert_eq!(number_from_value(&json!("1.234,5")), None);
    }

    #[test]
    fn test_fx_quote_comma_decimal_is_missing() {
        let item: FxQuoteItem = serde_json::from_value(json!({
            "Buying": "34,5012",
            "Selling": "34,5600",
            "Change": "0.25"
        }))
        .unwrap();

        assert_eq!(item.buying, None);
        assert_eq!(item.selling, None);
        assert_eq!(item.change, Some(0.25));
    }

    #[test]
    fn test_bad_field_does_not_reject_item() {
        let item: EquityStatsItem = serde_json::from_value(json!({
            "symbol": "ABC",
            "latestPrice": 10.5,
            "previousClose": "oops",
            "dayHigh": [1, 2],
        }))
        .unwrap();

        assert_eq!(item.symbol.as_deref(), Some("ABC"));
        assert_eq!(item.latest_price, Some(10.5));
        assert_eq!(item.previous_close, None);
        assert_eq!(item.day_high, None);
        assert_eq!(item.day_low, None);
    }

    #[test]
    fn test_crypto_ticker_string_numbers() {
        let item: CryptoTickerItem = serde_json::from_value(json!({
            "symbol": "BTCTRY",
            "lastPrice": "2150000.00000000",
            "priceChangePercent": "-1.250",
            "bidPrice": "2149990.0"
        }))
        .unwrap();

        assert_eq!(item.last_price, Some(2_150_000.0));
        assert_eq!(item.price_change_percent, Some(-1.25));
        assert_eq!(item.ask_price, None);
    }
}
