//! 국내 주식 종목 목록 Provider.
//!
//! `GET {base}/api/v1/hisse/list` 응답은 `{data: [{kod, ad, ...}]}` 형태입니다.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use ticker_core::Exchange;
use tracing::{debug, info};

use super::raw::{EquityListItem, RawInstrumentItem};
use super::{fetch_json, InstrumentSource};
use crate::error::{DataError, Result};

/// 국내 주식 목록 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BigparaConfig {
    pub base_url: String,
}

impl Default for BigparaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bigpara.hurriyet.com.tr".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Value>,
}

/// 국내 주식 종목 목록 클라이언트.
pub struct BigparaClient {
    client: reqwest::Client,
    config: BigparaConfig,
}

impl BigparaClient {
    pub fn new(client: reqwest::Client, config: BigparaConfig) -> Self {
        Self { client, config }
    }

    fn list_url(&self) -> String {
        format!(
            "{}/api/v1/hisse/list",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl InstrumentSource for BigparaClient {
    fn name(&self) -> &str {
        "bigpara"
    }

    async fn list_instruments(&self, exchange: Exchange) -> Result<Vec<RawInstrumentItem>> {
        if exchange != Exchange::Equity {
            return Err(DataError::InvalidData(format!(
                "{} provider는 {} 거래소를 지원하지 않습니다",
                self.name(),
                exchange
            )));
        }

        let response: ListResponse = fetch_json(self.client.get(self.list_url())).await?;
        let total = response.data.len();

        let items: Vec<RawInstrumentItem> = response
            .data
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<EquityListItem>(value) {
                Ok(item) if !item.code.trim().is_empty() => Some(RawInstrumentItem::EquityStock(item)),
                Ok(_) => None,
                Err(e) => {
                    debug!(error = %e, "주식 목록 항목 파싱 실패, 건너뜀");
                    None
                }
            })
            .collect();

        info!(total = total, parsed = items.len(), "주식 종목 목록 조회 완료");
        Ok(items)
    }
}
