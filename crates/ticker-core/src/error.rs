//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 도메인 값 파싱/검증 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// 알 수 없는 거래소 이름
    #[error("알 수 없는 거래소: {0}")]
    UnknownExchange(String),

    /// 알 수 없는 수집 계열 이름
    #[error("알 수 없는 수집 계열: {0}")]
    UnknownFamily(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
