//! 시세 수집 통합 테스트.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use common::{collector, instrument, FakePrices};
use mockito::{Matcher, Server};
use ticker_collector::modules::{ingest_family, refresh_prices};
use ticker_collector::{RefreshOutcome, Scheduler};
use ticker_core::{Exchange, ExchangeFamily, HOME_CURRENCY_CODE};
use ticker_data::{LaplaceClient, LaplaceConfig, ProviderSet};

fn laplace(base_url: String, batch_size: usize) -> Arc<LaplaceClient> {
    Arc::new(LaplaceClient::new(
        reqwest::Client::new(),
        LaplaceConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            batch_size,
            ..Default::default()
        },
    ))
}

fn symbols(value: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("symbols".into(), value.into()),
        Matcher::UrlEncoded("region".into(), "tr".into()),
    ])
}

async fn seed(collector: &ticker_collector::Collector, exchange: Exchange, codes: &[&str]) {
    let list: Vec<_> = codes.iter().map(|code| instrument(code, exchange)).collect();
    collector
        .instruments()
        .replace_exchange(exchange, &list, Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_equity_snapshot_end_to_end() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/stock/stats")
        .match_query(symbols("ABC"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"symbol":"ABC","dayOpen":10.1,"previousClose":10.0,"dayHigh":11.0,"dayLow":9.8,"latestPrice":10.5,"dailyChange":0.05}]"#)
        .create_async()
        .await;

    let providers = ProviderSet::empty().with_prices(ExchangeFamily::Equity, laplace(server.url(), 150));
    let collector = collector(providers).await;
    seed(&collector, Exchange::Equity, &["ABC"]).await;

    let stats = ingest_family(&collector, ExchangeFamily::Equity).await.unwrap();
    assert_eq!(stats.success, 1);

    let snapshot = collector.prices().get("ABC").await.unwrap().unwrap();
    assert_eq!(snapshot.last, Some(10.5));
    assert_eq!(snapshot.high, Some(11.0));
    assert_eq!(snapshot.low, Some(9.8));
    assert!((snapshot.change_abs.unwrap() - 0.5).abs() < 1e-9);
    assert!((snapshot.change_percent.unwrap() - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_failed_batch_keeps_other_batches() {
    let mut server = Server::new_async().await;
    let ok = |a: &str, b: &str| format!(r#"[{{"symbol":"{}","latestPrice":1.0}},{{"symbol":"{}","latestPrice":2.0}}]"#, a, b);
    let _first = server
        .mock("GET", "/api/v2/stock/stats")
        .match_query(symbols("AAA,BBB"))
        .with_status(200)
        .with_body(ok("AAA", "BBB"))
        .create_async()
        .await;
    let _second = server
        .mock("GET", "/api/v2/stock/stats")
        .match_query(symbols("CCC,DDD"))
        .with_status(500)
        .create_async()
        .await;
    let _third = server
        .mock("GET", "/api/v2/stock/stats")
        .match_query(symbols("EEE,FFF"))
        .with_status(200)
        .with_body(ok("EEE", "FFF"))
        .create_async()
        .await;

    let providers = ProviderSet::empty().with_prices(ExchangeFamily::Equity, laplace(server.url(), 2));
    let collector = collector(providers).await;
    seed(&collector, Exchange::Equity, &["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]).await;

    let stats = ingest_family(&collector, ExchangeFamily::Equity).await.unwrap();
    assert_eq!(stats.failed_batches, 1);
    assert_eq!(stats.success, 4);

    let cached = collector.prices().list_by_exchange(Exchange::Equity).await.unwrap();
    let mut codes: Vec<_> = cached.iter().map(|s| s.code.as_str()).collect();
    codes.sort();
    assert_eq!(codes, vec!["AAA", "BBB", "EEE", "FFF"]);
}

#[tokio::test]
async fn test_failed_batch_keeps_previous_snapshot() {
    let providers = ProviderSet::empty().with_prices(ExchangeFamily::Crypto, FakePrices::new(100.0));
    let collector = collector(providers).await;
    seed(&collector, Exchange::Crypto, &["BTC"]).await;
    ingest_family(&collector, ExchangeFamily::Crypto).await.unwrap();

    let providers = ProviderSet::empty().with_prices(ExchangeFamily::Crypto, FakePrices::failing());
    let failing = ticker_collector::Collector::new(
        collector.database().clone(),
        providers,
        collector.config().clone(),
    );
    let stats = ingest_family(&failing, ExchangeFamily::Crypto).await.unwrap();
    assert_eq!(stats.failed_batches, 1);

    let snapshot = collector.prices().get("BTC").await.unwrap().unwrap();
    assert_eq!(snapshot.last, Some(100.0));
}

#[tokio::test]
async fn test_home_currency_written_when_upstream_fails() {
    let providers = ProviderSet::empty().with_prices(ExchangeFamily::FxCommodity, FakePrices::failing());
    let collector = collector(providers).await;
    seed(&collector, Exchange::Fx, &["USD", "EUR"]).await;

    let stats = ingest_family(&collector, ExchangeFamily::FxCommodity).await.unwrap();
    assert_eq!(stats.failed_batches, 1);

    let home = collector.prices().get(HOME_CURRENCY_CODE).await.unwrap().unwrap();
    assert_eq!(home.last, Some(1.0));
    assert_eq!(home.exchange, Exchange::Fx);
    assert!(collector.prices().get("USD").await.unwrap().is_none());
}

#[tokio::test]
async fn test_families_run_independently() {
    let providers = ProviderSet::empty()
        .with_prices(ExchangeFamily::Equity, FakePrices::new(70.0))
        .with_prices(ExchangeFamily::Crypto, FakePrices::new(50.0))
        .with_prices(ExchangeFamily::FxCommodity, FakePrices::new(30.0));
    let collector = Arc::new(collector(providers).await);
    seed(&collector, Exchange::Equity, &["AKBNK", "GARAN"]).await;
    seed(&collector, Exchange::Crypto, &["BTC", "ETH"]).await;
    seed(&collector, Exchange::Fx, &["USD"]).await;
    seed(&collector, Exchange::Commodity, &["GRA"]).await;

    // 저장 시각 정밀도와 무관하게 비교
    let before = Utc::now().trunc_subsecs(0);
    let results = refresh_prices(Arc::clone(&collector)).await;
    assert_eq!(results.len(), 3);
    for (family, result) in &results {
        assert!(result.is_ok(), "{} failed", family);
    }

    let expected = [
        ("AKBNK", Exchange::Equity, 70.0),
        ("GARAN", Exchange::Equity, 70.0),
        ("BTC", Exchange::Crypto, 50.0),
        ("ETH", Exchange::Crypto, 50.0),
        ("USD", Exchange::Fx, 30.0),
        ("GRA", Exchange::Commodity, 30.0),
        (HOME_CURRENCY_CODE, Exchange::Fx, 1.0),
    ];
    let cached = collector.prices().list_all().await.unwrap();
    assert_eq!(cached.len(), expected.len());

    for (code, exchange, last) in expected {
        let snapshot = collector.prices().get(code).await.unwrap().unwrap();
        assert_eq!(snapshot.exchange, exchange, "{}", code);
        assert_eq!(snapshot.last, Some(last), "{}", code);
        assert!(snapshot.observed_at >= before, "{} is stale", code);
    }
}

#[tokio::test]
async fn test_persistence_failure_isolated_to_family() {
    let providers = ProviderSet::empty()
        .with_prices(ExchangeFamily::Crypto, FakePrices::new(50.0))
        .with_prices(ExchangeFamily::FxCommodity, FakePrices::new(30.0));
    let collector = Arc::new(collector(providers).await);
    seed(&collector, Exchange::Crypto, &["BTC"]).await;
    seed(&collector, Exchange::Fx, &["USD"]).await;

    sqlx::query(
        r#"
        CREATE TRIGGER reject_crypto BEFORE INSERT ON prices
        WHEN NEW.exchange = 'CRYPTO'
        BEGIN
            SELECT RAISE(ABORT, 'disk full');
        END
        "#,
    )
    .execute(collector.database().pool())
    .await
    .unwrap();

    let results = refresh_prices(Arc::clone(&collector)).await;
    for (family, result) in results {
        match family {
            ExchangeFamily::Crypto => {
                let err = result.unwrap_err();
                assert!(err.is_persistence());
            }
            _ => assert!(result.is_ok()),
        }
    }

    assert!(collector.prices().get("USD").await.unwrap().is_some());
    assert!(collector.prices().get("BTC").await.unwrap().is_none());
}

#[tokio::test]
async fn test_overlapping_refresh_is_skipped() {
    let providers = ProviderSet::empty()
        .with_prices(ExchangeFamily::Crypto, FakePrices::slow(1.0, Duration::from_millis(300)));
    let collector = Arc::new(collector(providers).await);
    seed(&collector, Exchange::Crypto, &["BTC"]).await;
    let scheduler = Scheduler::new(collector);

    let (first, second) = tokio::join!(scheduler.refresh_once(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.refresh_once().await
    });

    assert!(matches!(first, RefreshOutcome::Completed(_)));
    assert!(second.is_skipped());

    // 끝난 뒤에는 다시 실행 가능
    assert!(!scheduler.refresh_once().await.is_skipped());
}
