// src/connectors/messages.rs
use crate::connectors::traits::FetchError;
use crate::types::{BookLevel, MarketSnapshot};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// One entry of the public ticker list (`/exchange/ticker`).
/// Numeric fields arrive as strings or numbers depending on the market.
#[derive(Debug, Deserialize)]
pub struct CoinDcxTicker {
    pub market: String,

    #[serde(default)]
    pub last_price: Option<Decimal>,

    #[serde(default)]
    pub high: Option<Decimal>,

    #[serde(default)]
    pub low: Option<Decimal>,

    #[serde(default)]
    pub volume: Option<Decimal>,
}

impl CoinDcxTicker {
    pub fn into_snapshot(
        self,
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        timestamp: DateTime<Utc>,
    ) -> Result<MarketSnapshot, FetchError> {
        let price = self
            .last_price
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| FetchError::Malformed(format!("{}: missing last_price", self.market)))?;

        Ok(MarketSnapshot {
            price,
            high: self.high.filter(|h| *h > Decimal::ZERO).unwrap_or(price),
            low: self.low.filter(|l| *l > Decimal::ZERO).unwrap_or(price),
            volume: self.volume,
            bids,
            asks,
            timestamp,
            symbol: self.market,
        })
    }
}

/// Picks the requested market out of the full ticker list.
pub fn find_ticker(tickers: Vec<CoinDcxTicker>, symbol: &str) -> Result<CoinDcxTicker, FetchError> {
    tickers
        .into_iter()
        .find(|t| t.market.eq_ignore_ascii_case(symbol))
        .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))
}

/// Public order book (`/market_data/orderbook?pair=...`): price -> quantity
/// maps for each side.
#[derive(Debug, Default, Deserialize)]
pub struct CoinDcxOrderBook {
    #[serde(default)]
    pub bids: HashMap<String, Decimal>,

    #[serde(default)]
    pub asks: HashMap<String, Decimal>,
}

fn parse_levels(side: HashMap<String, Decimal>) -> Vec<BookLevel> {
    side.into_iter()
        .filter_map(|(price, quantity)| {
            let price = Decimal::from_str(&price).ok()?;
            Some(BookLevel { price, quantity })
        })
        .collect()
}

impl CoinDcxOrderBook {
    /// Bids sorted best (highest) first, asks best (lowest) first.
    pub fn into_levels(self) -> (Vec<BookLevel>, Vec<BookLevel>) {
        let mut bids = parse_levels(self.bids);
        let mut asks = parse_levels(self.asks);
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        (bids, asks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ticker_list_parsing() {
        let raw = r#"[
            {"market":"BTCINR","last_price":"5000000","high":"5100000","low":"4900000","volume":"12.5","timestamp":1700000000},
            {"market":"ETHUSDT","last_price":"2301.5","high":2350,"low":"2280.1","volume":"410.2","bid":"2301.4","ask":"2301.6"}
        ]"#;
        let tickers: Vec<CoinDcxTicker> = serde_json::from_str(raw).unwrap();
        let ticker = find_ticker(tickers, "ETHUSDT").unwrap();
        let snapshot = ticker.into_snapshot(vec![], vec![], Utc::now()).unwrap();

        assert_eq!(snapshot.symbol, "ETHUSDT");
        assert_eq!(snapshot.price, dec!(2301.5));
        assert_eq!(snapshot.high, dec!(2350));
        assert_eq!(snapshot.low, dec!(2280.1));
        assert_eq!(snapshot.volume, Some(dec!(410.2)));
    }

    #[test]
    fn unknown_symbol() {
        let tickers: Vec<CoinDcxTicker> =
            serde_json::from_str(r#"[{"market":"BTCINR","last_price":"1"}]"#).unwrap();
        assert!(matches!(
            find_ticker(tickers, "ETHUSDT"),
            Err(FetchError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn missing_price_is_malformed() {
        let tickers: Vec<CoinDcxTicker> =
            serde_json::from_str(r#"[{"market":"ETHUSDT","high":"10"}]"#).unwrap();
        let ticker = find_ticker(tickers, "ETHUSDT").unwrap();
        assert!(matches!(
            ticker.into_snapshot(vec![], vec![], Utc::now()),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn missing_range_falls_back_to_price() {
        let tickers: Vec<CoinDcxTicker> =
            serde_json::from_str(r#"[{"market":"ETHUSDT","last_price":"42"}]"#).unwrap();
        let snapshot = find_ticker(tickers, "ETHUSDT")
            .unwrap()
            .into_snapshot(vec![], vec![], Utc::now())
            .unwrap();
        assert_eq!(snapshot.high, dec!(42));
        assert_eq!(snapshot.low, dec!(42));
        assert_eq!(snapshot.volume, None);
    }

    #[test]
    fn order_book_sorted_by_side() {
        let raw = r#"{
            "bids": {"99.5": "1.0", "100.0": "2.5", "98.0": "3"},
            "asks": {"101.0": "0.5", "100.5": "1.5", "bad": "9"}
        }"#;
        let book: CoinDcxOrderBook = serde_json::from_str(raw).unwrap();
        let (bids, asks) = book.into_levels();

        let bid_prices: Vec<Decimal> = bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<Decimal> = asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![dec!(100.0), dec!(99.5), dec!(98.0)]);
        assert_eq!(ask_prices, vec![dec!(100.5), dec!(101.0)]);
        assert_eq!(bids[0].quantity, dec!(2.5));
    }

    #[test]
    fn empty_order_book() {
        let book: CoinDcxOrderBook = serde_json::from_str("{}").unwrap();
        let (bids, asks) = book.into_levels();
        assert!(bids.is_empty() && asks.is_empty());
    }
}
