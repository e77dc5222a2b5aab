//! 수집 작업이 공유하는 컨텍스트.

use ticker_data::{
    Database, DatabaseConfig, InstrumentRepository, PriceCache, ProviderSet, SyncStateRepository,
};

use crate::{CollectorConfig, Result};

/// 저장소, Provider, 설정 묶음.
///
/// 레지스트리 동기화와 시세 수집 모듈은 모두 이 타입을 통해 저장소와 Provider에 접근합니다.
#[derive(Clone)]
pub struct Collector {
    db: Database,
    providers: ProviderSet,
    config: CollectorConfig,
    instruments: InstrumentRepository,
    prices: PriceCache,
    sync_state: SyncStateRepository,
}

impl Collector {
    pub fn new(db: Database, providers: ProviderSet, config: CollectorConfig) -> Self {
        Self {
            instruments: InstrumentRepository::new(db.clone()),
            prices: PriceCache::new(db.clone()),
            sync_state: SyncStateRepository::new(db.clone()),
            db,
            providers,
            config,
        }
    }

    /// 설정으로 DB 연결, 스키마 생성, 기본 Provider 구성을 수행합니다.
    pub async fn from_config(config: CollectorConfig) -> Result<Self> {
        let db = Database::connect(&DatabaseConfig::new(config.database_url.as_str())).await?;
        db.init_schema().await?;
        let providers = ProviderSet::from_config(&config.providers)?;
        Ok(Self::new(db, providers, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn instruments(&self) -> &InstrumentRepository {
        &self.instruments
    }

    pub fn prices(&self) -> &PriceCache {
        &self.prices
    }

    pub fn sync_state(&self) -> &SyncStateRepository {
        &self.sync_state
    }
}
