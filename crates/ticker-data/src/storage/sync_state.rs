//! 거래소별 레지스트리 동기화 시각 저장소.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use ticker_core::{Exchange, SyncState};

use super::Database;
use crate::error::{DataError, Result};

/// 동기화 상태 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct SyncStateRecord {
    pub exchange: String,
    pub last_synced_at: DateTime<Utc>,
}

impl TryFrom<SyncStateRecord> for SyncState {
    type Error = DataError;

    fn try_from(record: SyncStateRecord) -> Result<Self> {
        let exchange = record
            .exchange
            .parse::<Exchange>()
            .map_err(|e| DataError::InvalidData(e.to_string()))?;
        Ok(SyncState::new(exchange, record.last_synced_at))
    }
}

/// 동기화 상태 repository.
#[derive(Clone)]
pub struct SyncStateRepository {
    db: Database,
}

impl SyncStateRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 거래소의 마지막 동기화 상태를 조회합니다.
    pub async fn get(&self, exchange: Exchange) -> Result<Option<SyncState>> {
        let record: Option<SyncStateRecord> =
            sqlx::query_as("SELECT exchange, last_synced_at FROM sync_state WHERE exchange = ?")
                .bind(exchange.as_str())
                .fetch_optional(self.db.pool())
                .await?;

        record.map(SyncState::try_from).transpose()
    }

    /// 거래소의 동기화 시각을 기록합니다.
    pub async fn set(&self, exchange: Exchange, synced_at: DateTime<Utc>) -> Result<()> {
        let mut conn = self.db.pool().acquire().await?;
        write_sync_state(&mut conn, exchange, synced_at).await
    }
}

/// 동기화 시각 기록. 레지스트리 교체 트랜잭션 안에서도 사용됩니다.
pub(crate) async fn write_sync_state(
    conn: &mut SqliteConnection,
    exchange: Exchange,
    synced_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sync_state (exchange, last_synced_at)
        VALUES (?, ?)
        ON CONFLICT (exchange) DO UPDATE SET last_synced_at = excluded.last_synced_at
        "#,
    )
    .bind(exchange.as_str())
    .bind(synced_at)
    .execute(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_get_and_set() {
        let db = Database::in_memory().await.unwrap();
        let repo = SyncStateRepository::new(db);

        assert!(repo.get(Exchange::Equity).await.unwrap().is_none());

        let first = Utc::now() - Duration::hours(20);
        repo.set(Exchange::Equity, first).await.unwrap();
        let second = Utc::now();
        repo.set(Exchange::Equity, second).await.unwrap();

        let state = repo.get(Exchange::Equity).await.unwrap().unwrap();
        assert_eq!(state.exchange, Exchange::Equity);
        assert!((state.last_synced_at - second).num_milliseconds().abs() < 1);
        assert!(repo.get(Exchange::Crypto).await.unwrap().is_none());
    }
}
