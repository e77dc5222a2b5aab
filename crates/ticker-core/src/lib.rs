//! # Ticker Core
//!
//! 종목 레지스트리와 시세 캐시가 공유하는 핵심 도메인 모델을 제공합니다.
//!
//! - 거래소(`Exchange`) 및 수집 계열(`ExchangeFamily`) 정의
//! - 종목(`Instrument`)과 최신 시세 스냅샷(`PriceSnapshot`)
//! - 레지스트리 동기화 상태(`SyncState`)
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::*;
pub use logging::*;
