//! 시세 데이터 수집과 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 상위 API Provider 클라이언트 (종목 목록, 시세)
//! - 원본 응답을 표준 레코드로 바꾸는 mapper
//! - SQLite 저장소 (종목 레지스트리, 시세 캐시, 동기화 상태)
//! - HTTP 계층용 읽기 API

pub mod error;
pub mod mapper;
pub mod provider;
pub mod query;
pub mod storage;

pub use error::{DataError, Result};
pub use mapper::{home_currency_snapshot, map_instrument, map_price};
pub use query::PriceQuery;

// 저장소 타입 재내보내기
pub use storage::{
    Database, DatabaseConfig, InstrumentRecord, InstrumentRepository, PriceCache, PriceRecord,
    SyncStateRecord, SyncStateRepository,
};

// Provider 재내보내기
pub use provider::{
    build_http_client, BigparaClient, BigparaConfig, BinanceClient, BinanceConfig, FetchMode,
    HttpConfig, InstrumentSource, LaplaceClient, LaplaceConfig, MatchPolicy, MatchedPrice,
    PriceBatch, PriceSource, ProviderSet, ProvidersConfig, RawInstrumentItem, RawPriceItem,
    TruncgilClient, TruncgilConfig,
};
