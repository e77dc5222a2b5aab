//! 에러 타입 정의.

use thiserror::Error;
use ticker_data::DataError;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 데이터 계층 에러 (저장소, Provider)
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 작업 태스크 에러 (panic, 취소)
    #[error("Task error: {0}")]
    Task(String),
}

impl CollectorError {
    /// 저장소 실패 여부
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Data(e) if e.is_persistence())
    }
}

impl From<tokio::task::JoinError> for CollectorError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            Self::Task(format!("task panicked: {}", err))
        } else {
            Self::Task(err.to_string())
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
