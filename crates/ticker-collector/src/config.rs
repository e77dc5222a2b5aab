//! 환경변수 기반 설정 모듈.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use ticker_core::Exchange;
use ticker_data::{
    BigparaConfig, BinanceConfig, FetchMode, HttpConfig, LaplaceConfig, MatchPolicy,
    ProvidersConfig, TruncgilConfig,
};

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 상위 Provider 설정
    pub providers: ProvidersConfig,
    /// 레지스트리 동기화 설정
    pub registry: RegistrySyncConfig,
    /// 스케줄러 설정
    pub scheduler: SchedulerConfig,
}

/// 레지스트리 동기화 설정
#[derive(Debug, Clone)]
pub struct RegistrySyncConfig {
    /// 같은 거래소를 다시 동기화하기까지의 최소 간격 (시간)
    pub staleness_hours: i64,
    /// staleness 검사를 받는 거래소
    pub gated_exchanges: Vec<Exchange>,
    /// 이보다 적은 종목 목록은 상위 장애로 간주
    pub min_instrument_count: usize,
}

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 시세 갱신 주기 (밀리초)
    pub price_refresh_interval_ms: u64,
    /// 첫 시세 갱신 전 대기 (밀리초)
    pub warmup_ms: u64,
    /// 일일 레지스트리 동기화 시각
    pub daily_sync: DailyTime,
    /// 일일 동기화 시각의 기준 시간대
    pub timezone: Tz,
}

impl Default for RegistrySyncConfig {
    fn default() -> Self {
        Self {
            staleness_hours: 16,
            gated_exchanges: vec![Exchange::Equity],
            min_instrument_count: 1,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            price_refresh_interval_ms: 60_000,
            warmup_ms: 2_000,
            daily_sync: DailyTime { hour: 5, minute: 0 },
            timezone: chrono_tz::Europe::Istanbul,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ticker.db".to_string(),
            providers: ProvidersConfig::default(),
            registry: RegistrySyncConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let http = HttpConfig {
            timeout: Duration::from_secs(env_var_parse("HTTP_TIMEOUT_SECS", 15)),
            ..HttpConfig::default()
        };

        let fetch_mode = match std::env::var("EQUITY_FETCH_MODE") {
            Ok(value) => value.parse::<FetchMode>().map_err(CollectorError::Config)?,
            Err(_) => FetchMode::Batched,
        };

        let providers = ProvidersConfig {
            http,
            equity_list: BigparaConfig {
                base_url: env_var_or("EQUITY_LIST_BASE_URL", defaults.providers.equity_list.base_url),
            },
            equity_price: LaplaceConfig {
                base_url: env_var_or("EQUITY_PRICE_BASE_URL", defaults.providers.equity_price.base_url),
                api_key: std::env::var("LAPLACE_API_KEY").ok().filter(|k| !k.is_empty()),
                batch_size: env_var_parse("EQUITY_BATCH_SIZE", 150),
                fetch_mode,
                per_item_concurrency: env_var_parse("PER_ITEM_CONCURRENCY", 4),
                match_policy: MatchPolicy::BySymbol,
            },
            crypto: BinanceConfig {
                base_url: env_var_or("CRYPTO_BASE_URL", defaults.providers.crypto.base_url),
                quote_asset: env_var_or("CRYPTO_QUOTE_ASSET", defaults.providers.crypto.quote_asset),
            },
            fx: TruncgilConfig {
                base_url: env_var_or("FX_BASE_URL", defaults.providers.fx.base_url),
                listing_reuse: defaults.providers.fx.listing_reuse,
            },
        };

        let daily_sync = match std::env::var("DAILY_SYNC_TIME") {
            Ok(value) => value.parse::<DailyTime>()?,
            Err(_) => defaults.scheduler.daily_sync,
        };
        let timezone = match std::env::var("SYNC_TIMEZONE") {
            Ok(value) => value.parse::<Tz>().map_err(|e| {
                CollectorError::Config(format!("SYNC_TIMEZONE 값이 올바르지 않습니다: {} ({})", value, e))
            })?,
            Err(_) => defaults.scheduler.timezone,
        };

        Ok(Self {
            database_url: env_var_or("DATABASE_URL", defaults.database_url),
            providers,
            registry: RegistrySyncConfig {
                staleness_hours: env_var_parse("REGISTRY_STALENESS_HOURS", 16),
                min_instrument_count: env_var_parse("MIN_INSTRUMENT_COUNT", 1),
                ..defaults.registry
            },
            scheduler: SchedulerConfig {
                price_refresh_interval_ms: env_var_parse("PRICE_REFRESH_INTERVAL_MS", 60_000),
                warmup_ms: env_var_parse("PRICE_REFRESH_WARMUP_MS", 2_000),
                daily_sync,
                timezone,
            },
        })
    }
}

impl RegistrySyncConfig {
    /// staleness 기간을 chrono Duration으로 반환
    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::hours(self.staleness_hours)
    }

    pub fn is_gated(&self, exchange: Exchange) -> bool {
        self.gated_exchanges.contains(&exchange)
    }
}

impl SchedulerConfig {
    /// 시세 갱신 주기를 Duration으로 반환 (0이면 1ms)
    pub fn price_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.price_refresh_interval_ms.max(1))
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// `now` 이후 첫 일일 동기화 시각
    pub fn next_daily_sync(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.daily_sync.next_after(now, &self.timezone)
    }
}

/// 하루 중 벽시계 시각.
///
/// `"HH:MM"` 또는 5필드 cron 형식 `"M H * * *"`를 받습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTime {
    pub hour: u32,
    pub minute: u32,
}

impl DailyTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// `tz` 기준으로 `now` 이후 처음 도래하는 이 시각
    pub fn next_after<Z: TimeZone>(&self, now: DateTime<Utc>, tz: &Z) -> DateTime<Utc> {
        let Some(time) = NaiveTime::from_hms_opt(self.hour, self.minute, 0) else {
            return now + chrono::Duration::days(1);
        };
        let today = now.with_timezone(tz).date_naive();

        // 서머타임 전환으로 존재하지 않는 시각은 다음 날로 넘깁니다.
        (0..=2u64)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .filter_map(|date| tz.from_local_datetime(&date.and_time(time)).earliest())
            .map(|local| local.with_timezone(&Utc))
            .find(|candidate| *candidate > now)
            .unwrap_or_else(|| now + chrono::Duration::days(1))
    }
}

impl FromStr for DailyTime {
    type Err = CollectorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || CollectorError::Config(format!("DAILY_SYNC_TIME 형식이 올바르지 않습니다: {}", s));
        let fields: Vec<&str> = s.split_whitespace().collect();

        let (hour, minute) = match fields.as_slice() {
            [single] => {
                let (h, m) = single.split_once(':').ok_or_else(invalid)?;
                (h.parse::<u32>().map_err(|_| invalid())?, m.parse::<u32>().map_err(|_| invalid())?)
            }
            [m, h, "*", "*", "*"] => (
                h.parse::<u32>().map_err(|_| invalid())?,
                m.parse::<u32>().map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };

        Self::new(hour, minute).ok_or_else(invalid)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수 문자열 (비어 있으면 기본값)
fn env_var_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_time_parse() {
        assert_eq!("05:00".parse::<DailyTime>().unwrap(), DailyTime { hour: 5, minute: 0 });
        assert_eq!("0 5 * * *".parse::<DailyTime>().unwrap(), DailyTime { hour: 5, minute: 0 });
        assert_eq!("30 23 * * *".parse::<DailyTime>().unwrap(), DailyTime { hour: 23, minute: 30 });
        assert!("24:00".parse::<DailyTime>().is_err());
        assert!("0 5 * * 1".parse::<DailyTime>().is_err());
        assert!("noon".parse::<DailyTime>().is_err());
    }

    #[test]
    fn test_next_after_in_istanbul() {
        let daily = DailyTime { hour: 5, minute: 0 };
        let tz = chrono_tz::Europe::Istanbul;

        // 01:00 UTC = 04:00 Istanbul (UTC+3) → 같은 날 05:00 Istanbul = 02:00 UTC
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap();
        assert_eq!(
            daily.next_after(now, &tz),
            Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap()
        );

        // 정확히 그 시각이면 다음 날
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap();
        assert_eq!(
            daily.next_after(now, &tz),
            Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.scheduler.price_refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.scheduler.warmup(), Duration::from_secs(2));
        assert_eq!(config.registry.staleness(), chrono::Duration::hours(16));
        assert!(config.registry.is_gated(Exchange::Equity));
        assert!(!config.registry.is_gated(Exchange::Crypto));
        assert_eq!(config.providers.equity_price.batch_size, 150);
    }
}
