//! SQLite 연결 풀과 스키마 부트스트랩.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::{DataError, Result};

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 데이터베이스 URL (sqlite://ticker.db, sqlite::memory:)
    pub url: String,
    /// 풀의 최대 연결 수
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ticker.db".to_string(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// 스키마. 각 문장은 여러 번 실행해도 안전합니다.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS instruments (
        exchange        TEXT    NOT NULL,
        code            TEXT    NOT NULL,
        name            TEXT    NOT NULL,
        instrument_type TEXT    NOT NULL,
        icon_ref        TEXT    NOT NULL,
        position        INTEGER NOT NULL,
        synced_at       TEXT    NOT NULL,
        PRIMARY KEY (exchange, code)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_instruments_code ON instruments (code)",
    r#"
    CREATE TABLE IF NOT EXISTS prices (
        code            TEXT PRIMARY KEY,
        name            TEXT NOT NULL,
        exchange        TEXT NOT NULL,
        icon_ref        TEXT NOT NULL,
        open            REAL,
        close           REAL,
        high            REAL,
        low             REAL,
        last            REAL NOT NULL,
        change_abs      REAL,
        change_percent  REAL,
        turnover_value  REAL,
        turnover_volume REAL,
        volatility      REAL,
        bid             REAL,
        ask             REAL,
        observed_at     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_prices_exchange ON prices (exchange)",
    r#"
    CREATE TABLE IF NOT EXISTS sync_state (
        exchange       TEXT PRIMARY KEY,
        last_synced_at TEXT NOT NULL
    )
    "#,
];

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    ///
    /// 인메모리 데이터베이스는 연결이 닫히면 내용이 사라지므로 단일 연결을 계속 유지합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to database...");

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DataError::ConnectionError(e.to_string()))?
            .create_if_missing(true);

        let mut pool_options =
            SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

        if config.is_in_memory() {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            pool_options = pool_options.max_connections(config.max_connections.max(1));
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");
        Ok(Self { pool })
    }

    /// 테스트용 인메모리 데이터베이스 (스키마 포함).
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect(&DatabaseConfig::new("sqlite::memory:")).await?;
        db.init_schema().await?;
        Ok(db)
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 테이블과 인덱스를 생성합니다. 스케줄러 시작 전에 한 번 실행합니다.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;
        Ok(true)
    }

    /// 연결 풀을 닫습니다.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.init_schema().await.unwrap();
        db.init_schema().await.unwrap();
        assert!(db.health_check().await.unwrap());
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(DatabaseConfig::new("sqlite::memory:").is_in_memory());
        assert!(DatabaseConfig::new("sqlite://file:test?mode=memory&cache=shared").is_in_memory());
        assert!(!DatabaseConfig::default().is_in_memory());
    }
}
