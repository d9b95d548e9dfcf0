use super::Reading;
use crate::types::BookLevel;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

fn depth(levels: &[BookLevel], top_n: usize) -> Decimal {
    levels
        .iter()
        .take(top_n)
        .map(|level| level.quantity.max(Decimal::ZERO))
        .sum()
}

/// Normalized imbalance of the top `top_n` levels, in `[-1, 1]`.
///
/// An empty side or zero total volume carries no information and yields
/// `Reading::Degenerate(0.0)`, which keeps both pressure thresholds shut.
pub fn order_book_pressure(bids: &[BookLevel], asks: &[BookLevel], top_n: usize) -> Reading {
    if bids.is_empty() || asks.is_empty() {
        return Reading::Degenerate(0.0);
    }

    let bid_volume = depth(bids, top_n);
    let ask_volume = depth(asks, top_n);
    let total = bid_volume + ask_volume;
    if total.is_zero() {
        return Reading::Degenerate(0.0);
    }

    let pressure = ((bid_volume - ask_volume) / total).to_f64().unwrap_or(0.0);
    Reading::Value(pressure)
}
