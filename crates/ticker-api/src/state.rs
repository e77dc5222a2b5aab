//! 핸들러 공유 상태.

use ticker_data::{Database, PriceQuery};

/// 애플리케이션 상태.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub query: PriceQuery,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            query: PriceQuery::new(db.clone()),
            db,
        }
    }

    pub async fn is_db_healthy(&self) -> bool {
        self.db.health_check().await.unwrap_or(false)
    }
}
