//! 데이터 Provider 모듈.
//!
//! 상위 API마다 하나의 클라이언트가 있으며, 각 클라이언트는 엔드포인트와 배치 제한,
//! 응답 형태를 알고 있습니다.
//!
//! - `BigparaClient`: 국내 주식 종목 목록
//! - `LaplaceClient`: 국내 주식 시세 (URL 배치, 심볼 키 매칭)
//! - `BinanceClient`: 암호화폐 종목 목록과 시세 (단일 전체 조회)
//! - `TruncgilClient`: 통화/원자재 종목 목록과 시세 (단일 전체 조회)
//!
//! 두 개의 trait가 경계입니다. 레지스트리 동기화는 `InstrumentSource`를,
//! 시세 수집은 `PriceSource`를 사용합니다.

pub mod bigpara;
pub mod binance;
pub mod laplace;
pub mod raw;
pub mod truncgil;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use ticker_core::{Exchange, ExchangeFamily, Instrument};

use crate::error::{DataError, Result};

pub use bigpara::{BigparaClient, BigparaConfig};
pub use binance::{BinanceClient, BinanceConfig};
pub use laplace::{FetchMode, LaplaceClient, LaplaceConfig, MatchPolicy};
pub use raw::{RawInstrumentItem, RawPriceItem};
pub use truncgil::{CommodityDef, TruncgilClient, TruncgilConfig};

/// 요청한 종목과 짝지어진 원본 시세 항목.
#[derive(Debug, Clone)]
pub struct MatchedPrice {
    pub instrument: Instrument,
    pub raw: RawPriceItem,
}

/// 상위 요청 하나의 결과.
///
/// 한 배치의 실패는 그 배치에만 해당하며 형제 배치에 영향을 주지 않습니다.
#[derive(Debug)]
pub struct PriceBatch {
    /// 배치 순번 (0부터, 종목 목록 순서)
    pub index: usize,
    /// 이 배치에서 요청한 종목 수
    pub requested: usize,
    pub result: Result<Vec<MatchedPrice>>,
}

/// 종목 목록 Provider trait.
#[async_trait]
pub trait InstrumentSource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 거래소의 전체 종목 목록 조회.
    async fn list_instruments(&self, exchange: Exchange) -> Result<Vec<RawInstrumentItem>>;
}

/// 시세 Provider trait.
pub trait PriceSource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 종목들의 현재 시세 조회.
    ///
    /// Provider의 배치 정책에 따라 요청을 나누고, 종목 목록 순서대로 배치 결과를 내보냅니다.
    fn fetch_prices<'a>(&'a self, instruments: &'a [Instrument]) -> BoxStream<'a, PriceBatch>;
}

/// HTTP 클라이언트 공통 설정.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: "Mozilla/5.0 (compatible; ticker-collector)".to_string(),
        }
    }
}

/// 타임아웃과 User-Agent가 설정된 HTTP 클라이언트 생성.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))
}

/// 요청을 보내고 2xx 응답 본문을 JSON으로 파싱합니다.
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DataError::UpstreamStatus {
            status: status.as_u16(),
            url: redact_url(response.url()),
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(200).collect();
        DataError::ParseError(format!("JSON 파싱 실패: {} - {}", e, preview))
    })
}

/// 로그에 남기기 전에 쿼리 문자열(API 키 포함 가능)을 제거합니다.
fn redact_url(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// 전체 Provider 설정.
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    pub http: HttpConfig,
    pub equity_list: BigparaConfig,
    pub equity_price: LaplaceConfig,
    pub crypto: BinanceConfig,
    pub fx: TruncgilConfig,
}

/// 거래소별 종목 Provider와 계열별 시세 Provider 묶음.
#[derive(Clone)]
pub struct ProviderSet {
    instruments: HashMap<Exchange, Arc<dyn InstrumentSource>>,
    prices: HashMap<ExchangeFamily, Arc<dyn PriceSource>>,
}

impl ProviderSet {
    /// 빈 Provider 묶음.
    pub fn empty() -> Self {
        Self {
            instruments: HashMap::new(),
            prices: HashMap::new(),
        }
    }

    /// 설정에서 기본 클라이언트들을 구성합니다.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let http = build_http_client(&config.http)?;

        let bigpara = Arc::new(BigparaClient::new(http.clone(), config.equity_list.clone()));
        let laplace = Arc::new(LaplaceClient::new(http.clone(), config.equity_price.clone()));
        let binance = Arc::new(BinanceClient::new(http.clone(), config.crypto.clone()));
        let truncgil = Arc::new(TruncgilClient::new(http, config.fx.clone()));

        Ok(Self::empty()
            .with_instruments(Exchange::Equity, bigpara)
            .with_instruments(Exchange::Crypto, binance.clone())
            .with_instruments(Exchange::Fx, truncgil.clone())
            .with_instruments(Exchange::Commodity, truncgil.clone())
            .with_prices(ExchangeFamily::Equity, laplace)
            .with_prices(ExchangeFamily::Crypto, binance)
            .with_prices(ExchangeFamily::FxCommodity, truncgil))
    }

    pub fn with_instruments(mut self, exchange: Exchange, source: Arc<dyn InstrumentSource>) -> Self {
        self.instruments.insert(exchange, source);
        self
    }

    pub fn with_prices(mut self, family: ExchangeFamily, source: Arc<dyn PriceSource>) -> Self {
        self.prices.insert(family, source);
        self
    }

    pub fn instrument_source(&self, exchange: Exchange) -> Option<Arc<dyn InstrumentSource>> {
        self.instruments.get(&exchange).cloned()
    }

    pub fn price_source(&self, family: ExchangeFamily) -> Option<Arc<dyn PriceSource>> {
        self.prices.get(&family).cloned()
    }
}
