//! API 에러 응답 타입.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// 모든 엔드포인트 공통 에러 응답.
///
/// ```json
/// { "code": "PRICE_NOT_AVAILABLE", "message": "Price for ABC is not available yet" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_INPUT", "PRICE_NOT_AVAILABLE", "DB_ERROR")
    pub code: String,
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

pub(crate) fn api_error(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}
