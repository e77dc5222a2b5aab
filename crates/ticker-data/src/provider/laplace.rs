//! 국내 주식 시세 Provider.
//!
//! `GET {base}/api/v2/stock/stats?symbols=A,B,...&region=tr&api_key=KEY`
//!
//! 요청 하나에 최대 `batch_size`개 심볼을 담습니다. 응답 항목은 명시적인 `symbol`
//! 필드로 요청 종목과 짝지어집니다. 위치 기반 매칭은 하위 호환용으로만 남아 있습니다.

use std::collections::HashMap;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use ticker_core::Instrument;
use tracing::{debug, warn};

use super::raw::{EquityStatsItem, RawPriceItem};
use super::{fetch_json, MatchedPrice, PriceBatch, PriceSource};
use crate::error::{DataError, Result};

/// 요청 분할 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// 여러 심볼을 URL 하나에 담아 요청
    #[default]
    Batched,
    /// 종목마다 한 번씩 요청 (동시성 제한 적용)
    PerItem,
}

impl std::str::FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" | "batched" => Ok(Self::Batched),
            "per_item" | "per-item" | "peritem" => Ok(Self::PerItem),
            _ => Err(format!("Unknown fetch mode: {}", s)),
        }
    }
}

/// 응답 항목을 요청 종목과 짝짓는 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// `symbol` 필드로 매칭
    #[default]
    BySymbol,
    /// 응답 순서가 요청 순서와 같다고 가정 (deprecated)
    Positional,
}

/// 국내 주식 시세 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct LaplaceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub fetch_mode: FetchMode,
    pub per_item_concurrency: usize,
    pub match_policy: MatchPolicy,
}

impl Default for LaplaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.getlaplace.com".to_string(),
            api_key: None,
            batch_size: 150,
            fetch_mode: FetchMode::Batched,
            per_item_concurrency: 4,
            match_policy: MatchPolicy::BySymbol,
        }
    }
}

/// 국내 주식 시세 클라이언트.
pub struct LaplaceClient {
    client: reqwest::Client,
    config: LaplaceConfig,
}

impl LaplaceClient {
    pub fn new(client: reqwest::Client, config: LaplaceConfig) -> Self {
        Self { client, config }
    }

    /// (청크 크기, 동시 요청 수)
    fn plan(&self) -> (usize, usize) {
        match self.config.fetch_mode {
            FetchMode::Batched => (self.config.batch_size.max(1), 1),
            FetchMode::PerItem => (1, self.config.per_item_concurrency.max(1)),
        }
    }

    async fn fetch_batch(&self, index: usize, chunk: &[Instrument]) -> PriceBatch {
        PriceBatch {
            index,
            requested: chunk.len(),
            result: self.request_batch(index, chunk).await,
        }
    }

    async fn request_batch(&self, index: usize, chunk: &[Instrument]) -> Result<Vec<MatchedPrice>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| DataError::ConfigError("LAPLACE_API_KEY가 설정되지 않았습니다".to_string()))?;

        let symbols = chunk
            .iter()
            .map(|instrument| instrument.code.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/api/v2/stock/stats",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self.client.get(url).query(&[
            ("symbols", symbols.as_str()),
            ("region", "tr"),
            ("api_key", api_key),
        ]);

        let values: Vec<Value> = fetch_json(request).await?;
        let items: Vec<Option<EquityStatsItem>> = values
            .into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| debug!(batch = index, error = %e, "시세 항목 파싱 실패, 건너뜀"))
                    .ok()
            })
            .collect();

        let matched = match self.config.match_policy {
            MatchPolicy::BySymbol => match_by_symbol(chunk, items),
            MatchPolicy::Positional => {
                warn!(batch = index, "위치 기반 매칭 사용 중 (deprecated), 심볼 매칭으로 전환하세요");
                match_by_position(chunk, items)
            }
        };
        Ok(matched)
    }
}

impl PriceSource for LaplaceClient {
    fn name(&self) -> &str {
        "laplace"
    }

    fn fetch_prices<'a>(&'a self, instruments: &'a [Instrument]) -> BoxStream<'a, PriceBatch> {
        let (chunk_size, concurrency) = self.plan();
        stream::iter(instruments.chunks(chunk_size).enumerate())
            .map(move |(index, chunk)| self.fetch_batch(index, chunk))
            .buffered(concurrency)
            .boxed()
    }
}

/// 요청 순서대로, 같은 심볼의 첫 응답 항목과 매칭합니다.
fn match_by_symbol(chunk: &[Instrument], items: Vec<Option<EquityStatsItem>>) -> Vec<MatchedPrice> {
    let mut by_symbol: HashMap<String, EquityStatsItem> = HashMap::new();
    for item in items.into_iter().flatten() {
        if let Some(symbol) = item.symbol.as_deref() {
            by_symbol
                .entry(symbol.trim().to_uppercase())
                .or_insert_with(|| item.clone());
        }
    }

    chunk
        .iter()
        .filter_map(|instrument| {
            by_symbol
                .get(&instrument.code.to_uppercase())
                .map(|item| MatchedPrice {
                    instrument: instrument.clone(),
                    raw: RawPriceItem::EquityStats(item.clone()),
                })
        })
        .collect()
}

fn match_by_position(chunk: &[Instrument], items: Vec<Option<EquityStatsItem>>) -> Vec<MatchedPrice> {
    chunk
        .iter()
        .zip(items)
        .filter_map(|(instrument, item)| {
            item.map(|item| MatchedPrice {
                instrument: instrument.clone(),
                raw: RawPriceItem::EquityStats(item),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticker_core::Exchange;

    fn stock(code: &str) -> Instrument {
        Instrument::new(code, code, Exchange::Equity, "Stock", "")
    }

    fn stats(symbol: &str, last: f64) -> Option<EquityStatsItem> {
        Some(EquityStatsItem {
            symbol: Some(symbol.to_string()),
            latest_price: Some(last),
            ..Default::default()
        })
    }

    #[test]
    fn test_fetch_mode_from_str() {
        assert_eq!("batch".parse::<FetchMode>().unwrap(), FetchMode::Batched);
        assert_eq!("PER_ITEM".parse::<FetchMode>().unwrap(), FetchMode::PerItem);
        assert!("bulk".parse::<FetchMode>().is_err());
    }

    #[test]
    fn test_match_by_symbol_ignores_response_order() {
        let chunk = vec![stock("AAA"), stock("BBB"), stock("CCC")];
        let items = vec![stats("CCC", 3.0), None, stats("AAA", 1.0)];

        let matched = match_by_symbol(&chunk, items);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].instrument.code, "AAA");
        assert_eq!(matched[1].instrument.code, "CCC");
        match &matched[1].raw {
            RawPriceItem::EquityStats(item) => assert_eq!(item.latest_price, Some(3.0)),
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_match_by_symbol_keeps_first_duplicate() {
        let chunk = vec![stock("AAA")];
        let items = vec![stats("AAA", 1.0), stats("aaa", 2.0)];

        let matched = match_by_symbol(&chunk, items);
        assert_eq!(matched.len(), 1);
        assert!(matches!(
            &matched[0].raw,
            RawPriceItem::EquityStats(item) if item.latest_price == Some(1.0)
        ));
    }

    #[test]
    fn test_match_by_position() {
        let chunk = vec![stock("AAA"), stock("BBB")];
        let items = vec![stats("X", 1.0), None];

        let matched = match_by_position(&chunk, items);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].instrument.code, "AAA");
    }

    #[test]
    fn test_plan() {
        let mut config = LaplaceConfig::default();
        let client = LaplaceClient::new(reqwest::Client::new(), config.clone());
        assert_eq!(client.plan(), (150, 1));

        config.fetch_mode = FetchMode::PerItem;
        config.per_item_concurrency = 0;
        let client = LaplaceClient::new(reqwest::Client::new(), config);
        assert_eq!(client.plan(), (1, 1));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_every_batch() {
        let config = LaplaceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            batch_size: 2,
            ..Default::default()
        };
        let client = LaplaceClient::new(reqwest::Client::new(), config);
        let instruments = vec![stock("AAA"), stock("BBB"), stock("CCC")];

        let batches: Vec<PriceBatch> = client.fetch_prices(&instruments).collect().await;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].requested, 2);
        assert_eq!(batches[1].requested, 1);
        assert!(batches
            .iter()
            .all(|b| matches!(b.result, Err(DataError::ConfigError(_)))));
    }
}
