//! 외환/원자재 Provider.
//!
//! `GET {base}/v4/today.json` 하나가 통화와 원자재 시세를 모두 제공합니다.
//! 응답은 코드를 키로 하는 객체입니다.
//!
//! 통화와 원자재 레지스트리 동기화는 같은 응답을 쓰므로, 종목 목록 조회는 짧은 시간 동안
//! 마지막 응답을 재사용합니다. 시세 조회는 항상 새로 요청합니다.
//!
//! ```json
//! { "USD": { "Type": "Currency", "Name": "ABD Doları", "Buying": 34.1, "Selling": 34.2, "Change": 0.12 } }
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};
use ticker_core::{Exchange, Instrument, HOME_CURRENCY_CODE};
use tracing::{debug, info};

use super::raw::{CommodityListItem, CurrencyListItem, FxQuoteItem, RawInstrumentItem, RawPriceItem};
use super::{fetch_json, InstrumentSource, MatchedPrice, PriceBatch, PriceSource};
use crate::error::{DataError, Result};

/// 레지스트리에 올릴 통화 코드 (응답에 `Type == "Currency"`로 있을 때만).
pub const CURRENCY_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "CHF", "CAD", "RUB", "AED", "AUD", "DKK", "SEK", "NOK", "JPY", "KWD",
    "ZAR", "BHD", "LYD", "SAR", "IQD", "ILS", "IRR", "INR", "MXN", "HUF", "NZD", "BRL", "IDR",
    "CZK", "PLN", "RON", "CNY", "ARS", "ALL", "AZN", "BAM", "CLP", "COP", "CRC", "DZD", "EGP",
    "HKD", "ISK", "KRW", "KZT", "LBP", "LKR", "MAD", "MDL", "MKD", "MYR", "OMR", "PEN", "PHP",
    "PKR", "QAR", "RSD", "SGD", "SYP", "THB", "TWD", "UAH", "UYU", "GEL", "TND", "BGN",
];

/// 원자재 정의.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommodityDef {
    pub code: &'static str,
    pub name: &'static str,
    pub commodity_type: &'static str,
    pub icon: &'static str,
}

const fn commodity(
    code: &'static str,
    name: &'static str,
    commodity_type: &'static str,
    icon: &'static str,
) -> CommodityDef {
    CommodityDef {
        code,
        name,
        commodity_type,
        icon,
    }
}

const GOLD_ICON: &str = "/images/xag.png";
const METAL_ICON: &str = "/images/xau.png";

/// 정적 원자재 표. 응답에 해당 코드가 있을 때만 레지스트리에 올라갑니다.
pub const COMMODITY_TABLE: &[CommodityDef] = &[
    commodity("GRA", "Gram Altın", "Gold", GOLD_ICON),
    commodity("ONS", "Ons Altın", "Gold", "/images/ons.png"),
    commodity("GUMUS", "Gümüş", "Silver", METAL_ICON),
    commodity("HAS", "Gram Has Altın", "Gold", GOLD_ICON),
    commodity("CEYREKALTIN", "Çeyrek Altın", "Gold", GOLD_ICON),
    commodity("YARIMALTIN", "Yarım Altın", "Gold", GOLD_ICON),
    commodity("TAMALTIN", "Tam Altın", "Gold", GOLD_ICON),
    commodity("CUMHURIYETALTINI", "Cumhuriyet Altını", "Gold", GOLD_ICON),
    commodity("ATAALTIN", "Ata Altın", "Gold", GOLD_ICON),
    commodity("14AYARALTIN", "14 Ayar Altın", "Gold", GOLD_ICON),
    commodity("18AYARALTIN", "18 Ayar Altın", "Gold", GOLD_ICON),
    commodity("YIA", "22 Ayar Bilezik", "Gold", GOLD_ICON),
    commodity("IKIBUCUKALTIN", "İkibuçuk Altın", "Gold", GOLD_ICON),
    commodity("BESLIALTIN", "Beşli Altın", "Gold", GOLD_ICON),
    commodity("GREMSEALTIN", "Gremse Altın", "Gold", GOLD_ICON),
    commodity("RESATALTIN", "Reşat Altın", "Gold", GOLD_ICON),
    commodity("HAMITALTIN", "Hamit Altın", "Gold", GOLD_ICON),
    commodity("GPL", "Gram Platin", "Platinum", METAL_ICON),
    commodity("PAL", "Gram Paladyum", "Palladium", METAL_ICON),
];

/// 외환/원자재 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct TruncgilConfig {
    pub base_url: String,
    /// 종목 목록 조회 응답 재사용 기간 (0이면 재사용 안 함)
    pub listing_reuse: Duration,
}

impl Default for TruncgilConfig {
    fn default() -> Self {
        Self {
            base_url: "https://finans.truncgil.com".to_string(),
            listing_reuse: Duration::from_secs(60),
        }
    }
}

type TodayPayload = Arc<Map<String, Value>>;

/// 외환/원자재 종목/시세 클라이언트.
pub struct TruncgilClient {
    client: reqwest::Client,
    config: TruncgilConfig,
    last_listing: Mutex<Option<(Instant, TodayPayload)>>,
}

impl TruncgilClient {
    pub fn new(client: reqwest::Client, config: TruncgilConfig) -> Self {
        Self {
            client,
            config,
            last_listing: Mutex::new(None),
        }
    }

    async fn fetch_today(&self) -> Result<Map<String, Value>> {
        let url = format!("{}/v4/today.json", self.config.base_url.trim_end_matches('/'));
        fetch_json(self.client.get(url)).await
    }

    /// 종목 목록용 응답. 재사용 기간 안이면 마지막 응답을 돌려줍니다.
    async fn fetch_listing(&self) -> Result<TodayPayload> {
        let reuse = self.config.listing_reuse;
        if let Ok(guard) = self.last_listing.lock() {
            if let Some((fetched_at, today)) = guard.as_ref() {
                if fetched_at.elapsed() < reuse {
                    debug!("외환/원자재 목록 응답 재사용");
                    return Ok(Arc::clone(today));
                }
            }
        }

        let today = Arc::new(self.fetch_today().await?);
        if let Ok(mut guard) = self.last_listing.lock() {
            *guard = Some((Instant::now(), Arc::clone(&today)));
        }
        Ok(today)
    }

    async fn fetch_quotes(&self, instruments: &[Instrument]) -> Result<Vec<MatchedPrice>> {
        let today = self.fetch_today().await?;

        Ok(instruments
            .iter()
            .filter(|instrument| !instrument.is_home_currency())
            .filter_map(|instrument| {
                let value = today.get(&instrument.code)?;
                match serde_json::from_value::<FxQuoteItem>(value.clone()) {
                    Ok(quote) => Some(MatchedPrice {
                        instrument: instrument.clone(),
                        raw: RawPriceItem::FxQuote(quote),
                    }),
                    Err(e) => {
                        debug!(code = %instrument.code, error = %e, "시세 항목 파싱 실패, 건너뜀");
                        None
                    }
                }
            })
            .collect())
    }
}

fn currency_items(today: &Map<String, Value>) -> Vec<RawInstrumentItem> {
    let mut items = vec![RawInstrumentItem::HomeCurrency];
    for &code in CURRENCY_CODES {
        if code == HOME_CURRENCY_CODE {
            continue;
        }
        let Some(entry) = today.get(code) else {
            continue;
        };
        if entry.get("Type").and_then(Value::as_str) != Some("Currency") {
            continue;
        }
        let name = entry
            .get("Name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(code);
        items.push(RawInstrumentItem::Currency(CurrencyListItem {
            code: code.to_string(),
            name: name.to_string(),
        }));
    }
    items
}

fn commodity_items(today: &Map<String, Value>) -> Vec<RawInstrumentItem> {
    COMMODITY_TABLE
        .iter()
        .filter(|def| today.contains_key(def.code))
        .map(|def| {
            RawInstrumentItem::Commodity(CommodityListItem {
                code: def.code.to_string(),
                name: def.name.to_string(),
                commodity_type: def.commodity_type.to_string(),
                icon: def.icon.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl InstrumentSource for TruncgilClient {
    fn name(&self) -> &str {
        "truncgil"
    }

    async fn list_instruments(&self, exchange: Exchange) -> Result<Vec<RawInstrumentItem>> {
        let items = match exchange {
            Exchange::Fx => currency_items(&*self.fetch_listing().await?),
            Exchange::Commodity => commodity_items(&*self.fetch_listing().await?),
            other => {
                return Err(DataError::InvalidData(format!(
                    "{} provider는 {} 거래소를 지원하지 않습니다",
                    InstrumentSource::name(self),
                    other
                )))
            }
        };

        info!(exchange = %exchange, count = items.len(), "외환/원자재 종목 목록 조회 완료");
        Ok(items)
    }
}

impl PriceSource for TruncgilClient {
    fn name(&self) -> &str {
        "truncgil"
    }

    fn fetch_prices<'a>(&'a self, instruments: &'a [Instrument]) -> BoxStream<'a, PriceBatch> {
        let requested = instruments
            .iter()
            .filter(|instrument| !instrument.is_home_currency())
            .count();
        if requested == 0 {
            return stream::empty::<PriceBatch>().boxed();
        }

        stream::once(async move {
            PriceBatch {
                index: 0,
                requested,
                result: self.fetch_quotes(instruments).await,
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> Map<String, Value> {
        let value = json!({
            "USD": {"Type": "Currency", "Name": "ABD Doları", "Buying": 34.1, "Selling": 34.2},
            "EUR": {"Type": "Currency", "Name": "", "Buying": 37.0, "Selling": 37.2},
            "GBP": {"Type": "Gold", "Name": "Not a currency"},
            "GRA": {"Type": "Gold", "Buying": 2900.0, "Selling": 2910.0},
            "Update_Date": "2024-01-01 10:00:00"
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_currency_items_home_currency_first() {
        let items = currency_items(&today());
        assert_eq!(items[0], RawInstrumentItem::HomeCurrency);
        assert_eq!(
            items[1],
            RawInstrumentItem::Currency(CurrencyListItem {
                code: "USD".into(),
                name: "ABD Doları".into()
            })
        );
        // 이름이 비어 있으면 코드로 대체
        assert_eq!(
            items[2],
            RawInstrumentItem::Currency(CurrencyListItem {
                code: "EUR".into(),
                name: "EUR".into()
            })
        );
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_commodity_items_only_present_codes() {
        let items = commodity_items(&today());
        assert_eq!(items.len(), 1);
        match &items[0] {
            RawInstrumentItem::Commodity(item) => {
                assert_eq!(item.code, "GRA");
                assert_eq!(item.commodity_type, "Gold");
                assert_eq!(item.icon, GOLD_ICON);
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_commodity_table_codes_unique() {
        let mut codes: Vec<&str> = COMMODITY_TABLE.iter().map(|def| def.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), COMMODITY_TABLE.len());
    }

    #[tokio::test]
    async fn test_home_currency_only_issues_no_request() {
        let client = TruncgilClient::new(reqwest::Client::new(), TruncgilConfig::default());
        let instruments = vec![Instrument::home_currency()];
        let batches: Vec<PriceBatch> = client.fetch_prices(&instruments).collect().await;
        assert!(batches.is_empty());
    }
}
