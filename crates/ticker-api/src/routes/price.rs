//! 캐시된 최신 시세 조회.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use ticker_core::PriceSnapshot;

use super::non_empty;
use crate::error::{api_error, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PriceParams {
    pub code: Option<String>,
}

/// GET /api/getprice?code=
pub async fn get_price(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceParams>,
) -> ApiResult<Json<PriceSnapshot>> {
    let Some(code) = non_empty(params.code.as_deref()) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            "code 파라미터가 필요합니다",
        ));
    };

    match state.query.get_cached_price(code).await {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "PRICE_NOT_AVAILABLE",
            format!("Price for {} is not available yet", code.to_uppercase()),
        )),
        Err(e) => {
            tracing::error!(code, error = %e, "시세 조회 실패");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR", e.to_string()))
        }
    }
}
