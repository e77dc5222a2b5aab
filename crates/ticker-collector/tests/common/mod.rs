//! 통합 테스트 공용 도구 (가짜 Provider, 인메모리 수집기).

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use ticker_collector::{Collector, CollectorConfig};
use ticker_core::{Exchange, Instrument};
use ticker_data::provider::raw::{CryptoTickerItem, EquityListItem, EquityStatsItem, FxQuoteItem};
use ticker_data::{
    DataError, Database, InstrumentSource, MatchedPrice, PriceBatch, PriceSource, ProviderSet,
    RawInstrumentItem, RawPriceItem,
};

/// 응답을 바꿔 끼울 수 있는 종목 목록 Provider.
pub struct FakeListing {
    calls: AtomicUsize,
    response: Mutex<Option<Vec<RawInstrumentItem>>>,
}

impl FakeListing {
    pub fn new(items: Vec<RawInstrumentItem>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response: Mutex::new(Some(items)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn respond_with(&self, items: Vec<RawInstrumentItem>) {
        *self.response.lock().unwrap() = Some(items);
    }

    pub fn fail(&self) {
        *self.response.lock().unwrap() = None;
    }
}

#[async_trait]
impl InstrumentSource for FakeListing {
    fn name(&self) -> &str {
        "fake-listing"
    }

    async fn list_instruments(&self, _exchange: Exchange) -> ticker_data::Result<Vec<RawInstrumentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DataError::UpstreamStatus {
                status: 503,
                url: "http://fake/list".to_string(),
            })
    }
}

/// 요청 종목마다 고정 가격을 돌려주는 시세 Provider.
pub struct FakePrices {
    price: f64,
    delay: Duration,
    fail: bool,
}

impl FakePrices {
    pub fn new(price: f64) -> Arc<Self> {
        Arc::new(Self {
            price,
            delay: Duration::ZERO,
            fail: false,
        })
    }

    pub fn slow(price: f64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            price,
            delay,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            price: 0.0,
            delay: Duration::ZERO,
            fail: true,
        })
    }

    fn raw_for(&self, instrument: &Instrument) -> RawPriceItem {
        match instrument.exchange {
            Exchange::Equity => RawPriceItem::EquityStats(EquityStatsItem {
                symbol: Some(instrument.code.clone()),
                latest_price: Some(self.price),
                ..Default::default()
            }),
            Exchange::Crypto => RawPriceItem::CryptoTicker(CryptoTickerItem {
                symbol: format!("{}TRY", instrument.code),
                last_price: Some(self.price),
                ..Default::default()
            }),
            _ => RawPriceItem::FxQuote(FxQuoteItem {
                buying: Some(self.price),
                selling: Some(self.price),
                ..Default::default()
            }),
        }
    }
}

impl PriceSource for FakePrices {
    fn name(&self) -> &str {
        "fake-prices"
    }

    fn fetch_prices<'a>(&'a self, instruments: &'a [Instrument]) -> BoxStream<'a, PriceBatch> {
        stream::once(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = if self.fail {
                Err(DataError::FetchError("connection reset".to_string()))
            } else {
                Ok(instruments
                    .iter()
                    .filter(|instrument| !instrument.is_home_currency())
                    .map(|instrument| MatchedPrice {
                        instrument: instrument.clone(),
                        raw: self.raw_for(instrument),
                    })
                    .collect())
            };
            PriceBatch {
                index: 0,
                requested: instruments.len(),
                result,
            }
        })
        .boxed()
    }
}

pub fn stock_item(code: &str) -> RawInstrumentItem {
    RawInstrumentItem::EquityStock(EquityListItem {
        code: code.to_string(),
        name: format!("{} A.S.", code),
    })
}

pub fn instrument(code: &str, exchange: Exchange) -> Instrument {
    Instrument::new(code, code, exchange, "Test", "")
}

pub async fn collector(providers: ProviderSet) -> Collector {
    collector_with_config(providers, CollectorConfig::default()).await
}

pub async fn collector_with_config(providers: ProviderSet, config: CollectorConfig) -> Collector {
    let db = Database::in_memory().await.unwrap();
    Collector::new(db, providers, config)
}
