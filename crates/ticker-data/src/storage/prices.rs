//! 최신 시세 캐시 (코드당 한 행).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticker_core::{Exchange, PriceSnapshot};

use super::Database;
use crate::error::{DataError, Result};

const SELECT_COLUMNS: &str = r#"
    SELECT code, name, exchange, icon_ref, open, close, high, low, last,
           change_abs, change_percent, turnover_value, turnover_volume,
           volatility, bid, ask, observed_at
    FROM prices
"#;

/// 시세 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct PriceRecord {
    pub code: String,
    pub name: String,
    pub exchange: String,
    pub icon_ref: String,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub last: f64,
    pub change_abs: Option<f64>,
    pub change_percent: Option<f64>,
    pub turnover_value: Option<f64>,
    pub turnover_volume: Option<f64>,
    pub volatility: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

impl TryFrom<PriceRecord> for PriceSnapshot {
    type Error = DataError;

    fn try_from(record: PriceRecord) -> Result<Self> {
        let exchange = record
            .exchange
            .parse::<Exchange>()
            .map_err(|e| DataError::InvalidData(e.to_string()))?;
        Ok(PriceSnapshot {
            code: record.code,
            name: record.name,
            exchange,
            icon_ref: record.icon_ref,
            open: record.open,
            close: record.close,
            high: record.high,
            low: record.low,
            last: Some(record.last),
            change_abs: record.change_abs,
            change_percent: record.change_percent,
            turnover_value: record.turnover_value,
            turnover_volume: record.turnover_volume,
            volatility: record.volatility,
            bid: record.bid,
            ask: record.ask,
            observed_at: record.observed_at,
        })
    }
}

/// 시세 캐시.
///
/// 쓰기는 즉시 SQLite에 반영되며 이후 읽기에서 바로 보입니다.
#[derive(Clone)]
pub struct PriceCache {
    db: Database,
}

impl PriceCache {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 코드 기준으로 스냅샷을 삽입하거나 모든 필드를 덮어씁니다.
    ///
    /// `last`가 없는 스냅샷은 거부합니다.
    pub async fn upsert(&self, snapshot: &PriceSnapshot) -> Result<()> {
        let last = snapshot.last.filter(|v| v.is_finite()).ok_or_else(|| {
            DataError::InvalidData(format!("{}: last 가격이 없는 스냅샷", snapshot.code))
        })?;

        sqlx::query(
            r#"
            INSERT INTO prices (
                code, name, exchange, icon_ref, open, close, high, low, last,
                change_abs, change_percent, turnover_value, turnover_volume,
                volatility, bid, ask, observed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                exchange = excluded.exchange,
                icon_ref = excluded.icon_ref,
                open = excluded.open,
                close = excluded.close,
                high = excluded.high,
                low = excluded.low,
                last = excluded.last,
                change_abs = excluded.change_abs,
                change_percent = excluded.change_percent,
                turnover_value = excluded.turnover_value,
                turnover_volume = excluded.turnover_volume,
                volatility = excluded.volatility,
                bid = excluded.bid,
                ask = excluded.ask,
                observed_at = excluded.observed_at
            "#,
        )
        .bind(&snapshot.code)
        .bind(&snapshot.name)
        .bind(snapshot.exchange.as_str())
        .bind(&snapshot.icon_ref)
        .bind(snapshot.open)
        .bind(snapshot.close)
        .bind(snapshot.high)
        .bind(snapshot.low)
        .bind(last)
        .bind(snapshot.change_abs)
        .bind(snapshot.change_percent)
        .bind(snapshot.turnover_value)
        .bind(snapshot.turnover_volume)
        .bind(snapshot.volatility)
        .bind(snapshot.bid)
        .bind(snapshot.ask)
        .bind(snapshot.observed_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn get(&self, code: &str) -> Result<Option<PriceSnapshot>> {
        let sql = format!("{} WHERE code = ?", SELECT_COLUMNS);
        let record: Option<PriceRecord> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(self.db.pool())
            .await?;

        record.map(PriceSnapshot::try_from).transpose()
    }

    pub async fn list_by_exchange(&self, exchange: Exchange) -> Result<Vec<PriceSnapshot>> {
        let sql = format!("{} WHERE exchange = ? ORDER BY code", SELECT_COLUMNS);
        let records: Vec<PriceRecord> = sqlx::query_as(&sql)
            .bind(exchange.as_str())
            .fetch_all(self.db.pool())
            .await?;

        records.into_iter().map(PriceSnapshot::try_from).collect()
    }

    pub async fn list_all(&self) -> Result<Vec<PriceSnapshot>> {
        let sql = format!("{} ORDER BY exchange, code", SELECT_COLUMNS);
        let records: Vec<PriceRecord> = sqlx::query_as(&sql).fetch_all(self.db.pool()).await?;

        records.into_iter().map(PriceSnapshot::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ticker_core::Instrument;

    fn snapshot(code: &str, exchange: Exchange, last: Option<f64>) -> PriceSnapshot {
        let inst = Instrument::new(code, code, exchange, "Stock", "");
        PriceSnapshot {
            last,
            ..PriceSnapshot::empty(&inst, Utc::now())
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_code() {
        let cache = PriceCache::new(Database::in_memory().await.unwrap());

        let mut first = snapshot("ABC", Exchange::Equity, Some(10.0));
        first.high = Some(12.0);
        cache.upsert(&first).await.unwrap();

        let mut second = snapshot("ABC", Exchange::Equity, Some(11.0));
        second.observed_at = first.observed_at + Duration::seconds(60);
        cache.upsert(&second).await.unwrap();

        let all = cache.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        let stored = cache.get("ABC").await.unwrap().unwrap();
        assert_eq!(stored.last, Some(11.0));
        // 모든 필드가 덮어써짐
        assert_eq!(stored.high, None);
        assert!(stored.observed_at > first.observed_at);
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_last() {
        let cache = PriceCache::new(Database::in_memory().await.unwrap());
        let result = cache.upsert(&snapshot("ABC", Exchange::Equity, None)).await;
        assert!(matches!(result, Err(DataError::InvalidData(_))));
        assert!(cache.get("ABC").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_exchange() {
        let cache = PriceCache::new(Database::in_memory().await.unwrap());
        cache.upsert(&snapshot("ABC", Exchange::Equity, Some(1.0))).await.unwrap();
        cache.upsert(&snapshot("BTC", Exchange::Crypto, Some(2.0))).await.unwrap();
        cache.upsert(&snapshot("ETH", Exchange::Crypto, Some(3.0))).await.unwrap();

        let crypto = cache.list_by_exchange(Exchange::Crypto).await.unwrap();
        let codes: Vec<&str> = crypto.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["BTC", "ETH"]);
        assert!(crypto.iter().all(|s| s.exchange == Exchange::Crypto));
    }
}
