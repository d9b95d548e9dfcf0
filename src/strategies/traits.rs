// src/strategies/traits.rs
use crate::connectors::traits::Ledger;
use crate::types::{ChartSnapshot, MarketSnapshot, TradeEvent};

/// What a strategy did with one tick.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Not enough history yet; no indicators were computed.
    WarmingUp { collected: usize, required: usize },
    Hold,
    /// A trade was due but the price has not moved enough since the last one.
    Stagnant,
    Traded(TradeEvent),
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Processes one snapshot. Trades are executed directly against `ledger`;
    /// at most one per tick.
    fn on_tick(&mut self, snapshot: &MarketSnapshot, ledger: &mut dyn Ledger) -> TickOutcome;

    /// Read-only copy of the history for renderers.
    fn chart(&self) -> ChartSnapshot;
}
