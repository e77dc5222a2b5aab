//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 상위 API 호출 실패 (네트워크, 타임아웃)
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 상위 API가 2xx가 아닌 상태 코드로 응답
    #[error("Upstream returned HTTP {status}: {url}")]
    UpstreamStatus { status: u16, url: String },

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 설정 오류 (예: API 키 누락)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DataError {
    /// 저장소 계층 오류인지 확인합니다.
    ///
    /// 저장소 오류는 파이프라인 경계까지 전파되고, 상위 API 오류는 배치 단위로 건너뜁니다.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            DataError::ConnectionError(_) | DataError::QueryError(_) | DataError::PoolExhausted
        )
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::PoolClosed => DataError::ConnectionError("pool closed".to_string()),
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DataError::ParseError(err.to_string())
        } else {
            DataError::FetchError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
