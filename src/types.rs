// src/types.rs
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// One price level of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// What the market data source hands to the engine once per tick.
///
/// Bids are sorted by price descending, asks ascending. A missing order book
/// is represented by empty vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Option<Decimal>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: DateTime<Utc>,
}

/// A single observation stored in the rolling history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub price: f64,
    pub high: f64,
    pub low: f64,
    pub volume: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl From<&MarketSnapshot> for Sample {
    fn from(snapshot: &MarketSnapshot) -> Self {
        let price = snapshot.price.to_f64().unwrap_or(f64::NAN);
        Self {
            price,
            high: snapshot.high.to_f64().unwrap_or(price),
            low: snapshot.low.to_f64().unwrap_or(price),
            volume: snapshot.volume.and_then(|v| v.to_f64()),
            timestamp: snapshot.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Uptrend => "uptrend",
            Trend::Downtrend => "downtrend",
            Trend::Sideways => "sideways",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Buy,
    Sell,
    MarketExit,
}

impl EventKind {
    pub fn side(&self) -> Side {
        match self {
            EventKind::Buy => Side::Buy,
            EventKind::Sell | EventKind::MarketExit => Side::Sell,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Buy => "BUY",
            EventKind::Sell => "SELL",
            EventKind::MarketExit => "MARKET_EXIT",
        };
        f.write_str(label)
    }
}

/// Result of a ledger mutation that actually moved funds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub side: Side,
    pub price: Decimal,
    /// Amount of the quoted asset bought or sold.
    pub quantity: Decimal,
    /// Amount of base currency spent or received.
    pub notional: Decimal,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub base: Decimal,
    pub quote: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub price: Decimal,
    pub context: String,
    pub fill: Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Derived indicator values for one tick. `None` marks a value that could not
/// be computed on that tick (warm-up or insufficient data).
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub cci: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub boll_mid: Option<f64>,
    pub boll_upper: Option<f64>,
    pub boll_lower: Option<f64>,
    pub pressure: Option<f64>,
    pub trend: Option<Trend>,
    pub flat_market: bool,
}

/// Read-only copy of the history for renderers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSnapshot {
    pub timestamps: Vec<DateTime<Utc>>,
    pub closes: Vec<f64>,
    pub volumes: Vec<Option<f64>>,
    pub frames: Vec<IndicatorFrame>,
    pub buy_points: Vec<TradePoint>,
    pub sell_points: Vec<TradePoint>,
    /// Top of the most recent order book, best level first.
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Chart(Box<ChartSnapshot>),
    Balances(Balances),
    Trade(TradeEvent),
    Log(String),
}
