//! 종목 검색.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use ticker_core::Instrument;

use super::non_empty;
use crate::error::{api_error, ApiResult};
use crate::state::AppState;

/// `exchange`: 거래소 (기존 이름 BIST, BINANCE, DOVIZ, EMTIA 허용)
/// `code`: 이름 또는 코드 부분 문자열
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub exchange: Option<String>,
    pub code: Option<String>,
}

/// GET /api/search?exchange=&code=
///
/// 알 수 없는 거래소는 빈 목록을 돌려줍니다.
pub async fn search_instruments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Instrument>>> {
    let exchange = non_empty(params.exchange.as_deref());
    let query = non_empty(params.code.as_deref());

    state
        .query
        .list_instruments(exchange, query)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "종목 검색 실패");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR", e.to_string())
        })
}
