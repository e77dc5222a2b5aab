//! SQLite 저장소.
//!
//! - `instruments`: 거래소별 종목 레지스트리
//! - `prices`: 코드별 최신 시세 스냅샷
//! - `sync_state`: 거래소별 마지막 레지스트리 동기화 시각

pub mod database;
pub mod instruments;
pub mod prices;
pub mod sync_state;

pub use database::{Database, DatabaseConfig};
pub use instruments::{InstrumentRecord, InstrumentRepository};
pub use prices::{PriceCache, PriceRecord};
pub use sync_state::{SyncStateRecord, SyncStateRepository};
