//! 종목 레지스트리 저장소.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticker_core::{Exchange, Instrument};
use tracing::{debug, instrument};

use super::sync_state::write_sync_state;
use super::Database;
use crate::error::{DataError, Result};

/// 종목 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct InstrumentRecord {
    pub exchange: String,
    pub code: String,
    pub name: String,
    pub instrument_type: String,
    pub icon_ref: String,
}

impl TryFrom<InstrumentRecord> for Instrument {
    type Error = DataError;

    fn try_from(record: InstrumentRecord) -> Result<Self> {
        let exchange = record
            .exchange
            .parse::<Exchange>()
            .map_err(|e| DataError::InvalidData(e.to_string()))?;
        Ok(Instrument::new(
            record.code,
            record.name,
            exchange,
            record.instrument_type,
            record.icon_ref,
        ))
    }
}

/// 종목 레지스트리 repository.
///
/// 거래소 단위로만 쓰기가 이루어집니다 ([`InstrumentRepository::replace_exchange`]).
#[derive(Clone)]
pub struct InstrumentRepository {
    db: Database,
}

impl InstrumentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 거래소의 종목 집합을 통째로 교체하고 동기화 시각을 기록합니다.
    ///
    /// 삭제, 삽입, 동기화 상태 기록이 하나의 트랜잭션으로 커밋됩니다. 같은 코드가
    /// 여러 번 나오면 첫 항목만 남습니다. 저장된 종목 수를 반환합니다.
    #[instrument(skip(self, instruments), fields(count = instruments.len()))]
    pub async fn replace_exchange(
        &self,
        exchange: Exchange,
        instruments: &[Instrument],
        synced_at: DateTime<Utc>,
    ) -> Result<usize> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM instruments WHERE exchange = ?")
            .bind(exchange.as_str())
            .execute(&mut *tx)
            .await?;

        let mut stored = 0usize;
        for (position, instrument) in instruments.iter().enumerate() {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO instruments
                    (exchange, code, name, instrument_type, icon_ref, position, synced_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(exchange.as_str())
            .bind(&instrument.code)
            .bind(&instrument.name)
            .bind(&instrument.instrument_type)
            .bind(&instrument.icon_ref)
            .bind(position as i64)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
            stored += result.rows_affected() as usize;
        }

        write_sync_state(&mut tx, exchange, synced_at).await?;
        tx.commit().await?;

        if stored < instruments.len() {
            debug!(
                exchange = %exchange,
                duplicates = instruments.len() - stored,
                "중복 코드 무시"
            );
        }
        Ok(stored)
    }

    /// 종목 목록 조회.
    ///
    /// `query`는 이름 또는 코드에 대한 대소문자 무시 부분 문자열 검색입니다.
    pub async fn list(&self, exchange: Option<Exchange>, query: Option<&str>) -> Result<Vec<Instrument>> {
        let records: Vec<InstrumentRecord> = match exchange {
            Some(exchange) => {
                sqlx::query_as(
                    r#"
                    SELECT exchange, code, name, instrument_type, icon_ref
                    FROM instruments WHERE exchange = ?
                    ORDER BY position
                    "#,
                )
                .bind(exchange.as_str())
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT exchange, code, name, instrument_type, icon_ref
                    FROM instruments
                    ORDER BY exchange, position
                    "#,
                )
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let mut instruments = Vec::with_capacity(records.len());
        for record in records {
            let instrument = Instrument::try_from(record)?;
            if query.map_or(true, |q| instrument.matches_query(q)) {
                instruments.push(instrument);
            }
        }
        Ok(instruments)
    }

    /// 거래소의 전체 종목을 등록 순서대로 조회합니다.
    pub async fn list_by_exchange(&self, exchange: Exchange) -> Result<Vec<Instrument>> {
        self.list(Some(exchange), None).await
    }

    pub async fn get(&self, exchange: Exchange, code: &str) -> Result<Option<Instrument>> {
        let record: Option<InstrumentRecord> = sqlx::query_as(
            r#"
            SELECT exchange, code, name, instrument_type, icon_ref
            FROM instruments WHERE exchange = ? AND code = ?
            "#,
        )
        .bind(exchange.as_str())
        .bind(code)
        .fetch_optional(self.db.pool())
        .await?;

        record.map(Instrument::try_from).transpose()
    }

    pub async fn count(&self, exchange: Exchange) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM instruments WHERE exchange = ?")
            .bind(exchange.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}
