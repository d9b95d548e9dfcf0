//! Fixtures shared by unit tests.
use crate::types::{BookLevel, MarketSnapshot};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// `levels` bid levels of `bid_qty` below 100 and ask levels of `ask_qty` above.
pub fn book(bid_qty: Decimal, ask_qty: Decimal, levels: usize) -> (Vec<BookLevel>, Vec<BookLevel>) {
    let bids = (0..levels)
        .map(|i| BookLevel {
            price: dec!(99) - Decimal::from(i),
            quantity: bid_qty,
        })
        .collect();
    let asks = (0..levels)
        .map(|i| BookLevel {
            price: dec!(101) + Decimal::from(i),
            quantity: ask_qty,
        })
        .collect();
    (bids, asks)
}

pub fn snapshot(tick: usize, price: f64, bids: &[BookLevel], asks: &[BookLevel]) -> MarketSnapshot {
    MarketSnapshot {
        symbol: "ETHUSDT".to_string(),
        price: Decimal::from_f64(price).unwrap(),
        high: Decimal::from_f64(price * 1.001).unwrap(),
        low: Decimal::from_f64(price * 0.999).unwrap(),
        volume: Some(dec!(10)),
        bids: bids.to_vec(),
        asks: asks.to_vec(),
        timestamp: start() + Duration::seconds(tick as i64 * 3),
    }
}

/// `count` evenly spaced prices from `from` to `to` inclusive.
pub fn linear(from: f64, to: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| from + i as f64 * (to - from) / (count - 1) as f64)
        .collect()
}
