//! 종목 레지스트리와 시세 캐시 HTTP 읽기 API.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - DB 연결 확인 (readiness)
//! - `/api/search` - 종목 검색
//! - `/api/getprice` - 캐시된 최신 시세

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiErrorResponse;
pub use routes::create_router;
pub use state::AppState;
