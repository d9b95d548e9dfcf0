// src/core/history.rs
use crate::indicators::{self, IndicatorResult, Macd, MacdParams};
use crate::types::{BookLevel, ChartSnapshot, IndicatorFrame, Sample, Side, TradePoint};
use chrono::{DateTime, Utc};

/// Rolling window of observed samples and the indicator values derived from
/// them.
///
/// Columns are index-aligned: entry `i` of every column belongs to the same
/// tick. Each pushed sample gets a blank [`IndicatorFrame`] that the engine
/// fills in once indicators are computed. The MACD line is kept separately,
/// it only grows on ticks where MACD could be computed. Only the latest order
/// book is retained, for depth rendering.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    closes: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    volumes: Vec<Option<f64>>,
    timestamps: Vec<DateTime<Utc>>,
    frames: Vec<IndicatorFrame>,
    macd_line: Vec<f64>,
    buy_points: Vec<TradePoint>,
    sell_points: Vec<TradePoint>,
    bids: Vec<BookLevel>,
    asks: Vec<BookLevel>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            closes: Vec::with_capacity(capacity + 1),
            highs: Vec::with_capacity(capacity + 1),
            lows: Vec::with_capacity(capacity + 1),
            volumes: Vec::with_capacity(capacity + 1),
            timestamps: Vec::with_capacity(capacity + 1),
            frames: Vec::with_capacity(capacity + 1),
            macd_line: Vec::new(),
            buy_points: Vec::new(),
            sell_points: Vec::new(),
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.closes.push(sample.price);
        self.highs.push(sample.high);
        self.lows.push(sample.low);
        self.volumes.push(sample.volume);
        self.timestamps.push(sample.timestamp);
        self.frames.push(IndicatorFrame::default());
    }

    /// Replaces the frame of the newest sample.
    pub fn set_latest_frame(&mut self, frame: IndicatorFrame) {
        if let Some(last) = self.frames.last_mut() {
            *last = frame;
        }
    }

    /// Keeps the top `depth` levels of each side of the latest book.
    pub fn set_book(&mut self, bids: &[BookLevel], asks: &[BookLevel], depth: usize) {
        self.bids = bids.iter().take(depth).copied().collect();
        self.asks = asks.iter().take(depth).copied().collect();
    }

    pub fn record_trade(&mut self, side: Side, timestamp: DateTime<Utc>, price: f64) {
        let point = TradePoint { timestamp, price };
        match side {
            Side::Buy => self.buy_points.push(point),
            Side::Sell => self.sell_points.push(point),
        }
    }

    /// Drops the oldest entries beyond capacity. Called once a tick is fully
    /// processed.
    pub fn enforce_capacity(&mut self) {
        self.assert_aligned();

        let excess = self.closes.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.closes.drain(..excess);
            self.highs.drain(..excess);
            self.lows.drain(..excess);
            self.volumes.drain(..excess);
            self.timestamps.drain(..excess);
            self.frames.drain(..excess);
        }

        let macd_excess = self.macd_line.len().saturating_sub(self.capacity);
        if macd_excess > 0 {
            self.macd_line.drain(..macd_excess);
        }

        if let Some(&oldest) = self.timestamps.first() {
            self.buy_points.retain(|p| p.timestamp >= oldest);
            self.sell_points.retain(|p| p.timestamp >= oldest);
        }
    }

    fn assert_aligned(&self) {
        let len = self.closes.len();
        assert!(
            self.highs.len() == len
                && self.lows.len() == len
                && self.volumes.len() == len
                && self.timestamps.len() == len
                && self.frames.len() == len,
            "history columns out of alignment"
        );
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn highs(&self) -> &[f64] {
        &self.highs
    }

    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    #[cfg(test)]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    #[cfg(test)]
    pub fn frames(&self) -> &[IndicatorFrame] {
        &self.frames
    }

    #[cfg(test)]
    pub fn latest_frame(&self) -> Option<&IndicatorFrame> {
        self.frames.last()
    }

    /// Computes MACD on the stored closes, extending the stored MACD line.
    pub fn macd(&mut self, params: MacdParams) -> IndicatorResult<Macd> {
        indicators::macd(&self.closes, &mut self.macd_line, params)
    }

    #[cfg(test)]
    pub fn macd_line(&self) -> &[f64] {
        &self.macd_line
    }

    #[cfg(test)]
    pub fn buy_points(&self) -> &[TradePoint] {
        &self.buy_points
    }

    #[cfg(test)]
    pub fn sell_points(&self) -> &[TradePoint] {
        &self.sell_points
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            timestamps: self.timestamps.clone(),
            closes: self.closes.clone(),
            volumes: self.volumes.clone(),
            frames: self.frames.clone(),
            buy_points: self.buy_points.clone(),
            sell_points: self.sell_points.clone(),
            bids: self.bids.clone(),
            asks: self.asks.clone(),
        }
    }
}
