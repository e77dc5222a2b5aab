//! 암호화폐 Provider.
//!
//! 종목 목록은 `exchangeInfo`, 시세는 `ticker/24hr` 전체 조회 한 번으로 가져와
//! 클라이언트 측에서 견적 통화로 필터링합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use ticker_core::{Exchange, Instrument};
use tracing::{debug, info};

use super::raw::{CryptoSymbolItem, CryptoTickerItem, RawInstrumentItem, RawPriceItem};
use super::{fetch_json, InstrumentSource, MatchedPrice, PriceBatch, PriceSource};
use crate::error::{DataError, Result};

/// 암호화폐 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    /// 견적 통화 (예: TRY)
    pub quote_asset: String,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            quote_asset: "TRY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeInfoResponse {
    #[serde(default)]
    symbols: Vec<Value>,
}

/// 암호화폐 종목/시세 클라이언트.
pub struct BinanceClient {
    client: reqwest::Client,
    config: BinanceConfig,
}

impl BinanceClient {
    pub fn new(client: reqwest::Client, config: BinanceConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn fetch_tickers(&self, instruments: &[Instrument]) -> Result<Vec<MatchedPrice>> {
        let values: Vec<Value> = fetch_json(self.client.get(self.url("/api/v3/ticker/24hr"))).await?;

        let mut by_code: HashMap<String, CryptoTickerItem> = HashMap::new();
        for value in values {
            let ticker: CryptoTickerItem = match serde_json::from_value(value) {
                Ok(ticker) => ticker,
                Err(e) => {
                    debug!(error = %e, "티커 항목 파싱 실패, 건너뜀");
                    continue;
                }
            };
            if let Some(code) = base_code(&ticker.symbol, &self.config.quote_asset) {
                by_code.entry(code).or_insert(ticker);
            }
        }

        Ok(instruments
            .iter()
            .filter_map(|instrument| {
                by_code.get(&instrument.code).map(|ticker| MatchedPrice {
                    instrument: instrument.clone(),
                    raw: RawPriceItem::CryptoTicker(ticker.clone()),
                })
            })
            .collect())
    }
}

/// 거래쌍 심볼에서 견적 통화 접미사를 제거합니다 (`BTCTRY` → `BTC`).
fn base_code(symbol: &str, quote_asset: &str) -> Option<String> {
    symbol
        .strip_suffix(quote_asset)
        .filter(|base| !base.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl InstrumentSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn list_instruments(&self, exchange: Exchange) -> Result<Vec<RawInstrumentItem>> {
        if exchange != Exchange::Crypto {
            return Err(DataError::InvalidData(format!(
                "{} provider는 {} 거래소를 지원하지 않습니다",
                InstrumentSource::name(self),
                exchange
            )));
        }

        let response: ExchangeInfoResponse =
            fetch_json(self.client.get(self.url("/api/v3/exchangeInfo"))).await?;
        let total = response.symbols.len();

        let items: Vec<RawInstrumentItem> = response
            .symbols
            .into_iter()
            .filter_map(|value| {
                serde_json::from_value::<CryptoSymbolItem>(value)
                    .map_err(|e| debug!(error = %e, "심볼 항목 파싱 실패, 건너뜀"))
                    .ok()
            })
            .filter(|item| item.quote_asset == self.config.quote_asset && item.status == "TRADING")
            .map(RawInstrumentItem::CryptoPair)
            .collect();

        info!(
            total = total,
            pairs = items.len(),
            quote = %self.config.quote_asset,
            "암호화폐 거래쌍 조회 완료"
        );
        Ok(items)
    }
}

impl PriceSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_prices<'a>(&'a self, instruments: &'a [Instrument]) -> BoxStream<'a, PriceBatch> {
        if instruments.is_empty() {
            return stream::empty::<PriceBatch>().boxed();
        }

        stream::once(async move {
            PriceBatch {
                index: 0,
                requested: instruments.len(),
                result: self.fetch_tickers(instruments).await,
            }
        })
        .boxed()
    }
}
