//! API 라우트.

pub mod health;
pub mod price;
pub mod search;

pub use health::{health_router, HealthResponse};
pub use price::{get_price, PriceParams};
pub use search::{search_instruments, SearchParams};

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 전체 라우터 생성.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health_router())
        .route("/api/search", get(search_instruments))
        .route("/api/getprice", get(get_price))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 빈 문자열 쿼리 파라미터는 없는 것으로 취급합니다.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
