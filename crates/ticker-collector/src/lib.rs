//! 종목 레지스트리 동기화와 시세 수집기.
//!
//! 이 crate는 다음을 제공합니다:
//! - 거래소별 종목 레지스트리 동기화 (staleness 검사, 원자적 교체)
//! - 계열별 동시 시세 수집과 캐시 기록
//! - 시작 동기화, 일일 재동기화, 주기적 시세 갱신을 묶는 스케줄러

pub mod collector;
pub mod config;
pub mod error;
pub mod modules;
pub mod scheduler;
pub mod stats;

pub use collector::Collector;
pub use config::{CollectorConfig, DailyTime, RegistrySyncConfig, SchedulerConfig};
pub use error::{CollectorError, Result};
pub use scheduler::{RefreshOutcome, Scheduler, SchedulerHandle};
pub use stats::{CollectionStats, IngestStats};
