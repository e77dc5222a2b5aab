//! 레지스트리 동기화 상태.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Exchange;

/// 거래소별 마지막 레지스트리 동기화 성공 시각.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub exchange: Exchange,
    pub last_synced_at: DateTime<Utc>,
}

impl SyncState {
    pub fn new(exchange: Exchange, last_synced_at: DateTime<Utc>) -> Self {
        Self {
            exchange,
            last_synced_at,
        }
    }

    /// `now` 기준으로 staleness 기간이 아직 지나지 않았는지 확인합니다.
    ///
    /// 시계가 뒤로 간 경우(`now < last_synced_at`)도 신선한 것으로 봅니다.
    pub fn is_fresh(&self, now: DateTime<Utc>, staleness: Duration) -> bool {
        now.signed_duration_since(self.last_synced_at) < staleness
    }
}
