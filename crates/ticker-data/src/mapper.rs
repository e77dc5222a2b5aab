//! 원본 Provider 항목을 표준 레코드로 변환합니다.
//!
//! 모든 함수는 순수하며 실패하지 않습니다. 숫자 필드가 없거나 잘못되면 해당 필드만
//! `None`이 되고 스냅샷 자체는 유지됩니다. 표시 가능 여부(`last` 존재)는
//! 호출자가 [`PriceSnapshot::is_valid`]로 판단합니다.

use chrono::{DateTime, Utc};
use ticker_core::{Exchange, Instrument, PriceSnapshot};

use crate::provider::raw::{
    CryptoTickerItem, EquityStatsItem, FxQuoteItem, RawInstrumentItem, RawPriceItem,
};

const EQUITY_ICON_BASE: &str = "https://cdn.jsdelivr.net/gh/ahmeterenodaci/Istanbul-Stock-Exchange--BIST--including-symbols-and-logos/logos";
const CRYPTO_ICON_BASE: &str = "https://cdn.jsdelivr.net/gh/vadimmalykhin/binance-icons/crypto";
const FLAG_ICON_BASE: &str = "https://flagcdn.com/w40";

/// 주식 로고 URL (대문자 코드).
pub fn equity_icon(code: &str) -> String {
    format!("{}/{}.png", EQUITY_ICON_BASE, code.to_uppercase())
}

/// 암호화폐 아이콘 URL (소문자 기초 자산).
pub fn crypto_icon(base_asset: &str) -> String {
    format!("{}/{}.svg", CRYPTO_ICON_BASE, base_asset.to_lowercase())
}

/// 통화 국기 URL (코드 앞 두 글자, 소문자).
pub fn currency_icon(code: &str) -> String {
    let country: String = code.to_lowercase().chars().take(2).collect();
    format!("{}/{}.png", FLAG_ICON_BASE, country)
}

/// 원본 종목 항목을 `exchange` 소속 종목으로 변환합니다.
pub fn map_instrument(item: &RawInstrumentItem, exchange: Exchange) -> Instrument {
    match item {
        RawInstrumentItem::EquityStock(stock) => {
            let code = stock.code.trim().to_uppercase();
            let icon = equity_icon(&code);
            Instrument::new(code, stock.name.trim(), exchange, "Stock", icon)
        }
        RawInstrumentItem::CryptoPair(pair) => Instrument::new(
            pair.base_asset.as_str(),
            format!("{} / {}", pair.base_asset, pair.quote_asset),
            exchange,
            "CryptoCurrency",
            crypto_icon(&pair.base_asset),
        ),
        RawInstrumentItem::Currency(currency) => Instrument::new(
            currency.code.as_str(),
            currency.name.as_str(),
            exchange,
            "Currency",
            currency_icon(&currency.code),
        ),
        RawInstrumentItem::Commodity(commodity) => Instrument::new(
            commodity.code.as_str(),
            commodity.name.as_str(),
            exchange,
            commodity.commodity_type.as_str(),
            commodity.icon.as_str(),
        ),
        RawInstrumentItem::HomeCurrency => Instrument::home_currency(),
    }
}

/// 원본 시세 항목과 요청 종목으로 스냅샷을 만듭니다.
pub fn map_price(item: &RawPriceItem, instrument: &Instrument, observed_at: DateTime<Utc>) -> PriceSnapshot {
    let snapshot = PriceSnapshot::empty(instrument, observed_at);
    match item {
        RawPriceItem::EquityStats(stats) => map_equity(stats, snapshot),
        RawPriceItem::CryptoTicker(ticker) => map_crypto(ticker, snapshot),
        RawPriceItem::FxQuote(quote) => map_fx(quote, snapshot),
        RawPriceItem::HomeCurrency => home_currency_snapshot(instrument, observed_at),
    }
}

/// 자국 통화 항등 스냅샷.
pub fn home_currency_snapshot(instrument: &Instrument, observed_at: DateTime<Utc>) -> PriceSnapshot {
    PriceSnapshot {
        last: Some(1.0),
        high: Some(1.0),
        low: Some(1.0),
        bid: Some(1.0),
        ask: Some(1.0),
        change_abs: Some(0.0),
        change_percent: Some(0.0),
        ..PriceSnapshot::empty(instrument, observed_at)
    }
}

fn map_equity(stats: &EquityStatsItem, snapshot: PriceSnapshot) -> PriceSnapshot {
    let last = stats.latest_price;
    PriceSnapshot {
        open: stats.day_open,
        close: stats.previous_close,
        high: stats.day_high,
        low: stats.day_low,
        last,
        change_abs: difference(last, stats.previous_close),
        // 비율로 제공됨
        change_percent: stats.daily_change.map(|ratio| ratio * 100.0),
        turnover_value: stats.market_cap,
        bid: last,
        ask: last,
        ..snapshot
    }
}

fn map_crypto(ticker: &CryptoTickerItem, snapshot: PriceSnapshot) -> PriceSnapshot {
    let last = ticker.last_price;
    PriceSnapshot {
        open: ticker.open_price,
        close: ticker.prev_close_price,
        high: ticker.high_price,
        low: ticker.low_price,
        last,
        change_abs: ticker
            .price_change
            .or_else(|| difference(last, ticker.prev_close_price)),
        change_percent: ticker.price_change_percent,
        turnover_value: ticker.quote_volume,
        turnover_volume: ticker.volume,
        bid: ticker.bid_price,
        ask: ticker.ask_price,
        ..snapshot
    }
}

fn map_fx(quote: &FxQuoteItem, snapshot: PriceSnapshot) -> PriceSnapshot {
    let last = match (quote.buying, quote.selling) {
        (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
        (Some(side), None) | (None, Some(side)) => Some(side),
        (None, None) => None,
    };

    PriceSnapshot {
        high: quote.high.filter(|v| *v != 0.0),
        low: quote.low.filter(|v| *v != 0.0),
        last,
        change_abs: fx_change_abs(last, quote.change),
        change_percent: quote.change,
        bid: quote.buying,
        ask: quote.selling,
        ..snapshot
    }
}

/// 변동률에서 역산한 전일 종가(`last / (1 + pct/100)`)와의 차이.
fn fx_change_abs(last: Option<f64>, percent: Option<f64>) -> Option<f64> {
    let (last, percent) = (last?, percent?);
    let base = 1.0 + percent / 100.0;
    if base == 0.0 {
        return None;
    }
    Some(last - last / base).filter(|v| v.is_finite())
}

fn difference(last: Option<f64>, previous: Option<f64>) -> Option<f64> {
    Some(last? - previous?)
}
