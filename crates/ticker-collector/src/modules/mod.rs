//! 수집 모듈.

pub mod price_ingest;
pub mod registry_sync;

pub use price_ingest::{collect_prices, ingest_family, refresh_prices, FamilyResult};
pub use registry_sync::{
    force_sync_registry, sync_all_registries, sync_registry, RegistrySyncReport, SyncOutcome,
};
