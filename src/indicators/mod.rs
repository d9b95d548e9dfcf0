//! Technical indicators computed over bounded price/volume sequences.
//!
//! Every function is pure: inputs are borrowed, nothing is mutated except the
//! caller-owned MACD line passed to [`momentum::macd`]. A function that does
//! not have enough samples returns [`IndicatorError::InsufficientData`] and the
//! caller skips whatever depends on it for that tick. Zero-division cases are
//! not errors; they come back as [`Reading::Degenerate`] carrying the neutral
//! value.

pub mod momentum;
pub mod moving_average;
pub mod order_book;
pub mod volatility;

pub use momentum::{cci, macd, rsi, stochastic, Macd, MacdParams};
pub use moving_average::{is_flat_market, trend_direction};
pub use order_book::order_book_pressure;
pub use volatility::{adx, atr, bollinger};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid period: {0}")]
    InvalidPeriod(String),
}

pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// Value of an indicator whose formula can divide by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    /// The formula was undefined for this input; holds the neutral sentinel.
    Degenerate(f64),
}

impl Reading {
    pub fn value(&self) -> f64 {
        match *self {
            Reading::Value(v) | Reading::Degenerate(v) => v,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Reading::Degenerate(_))
    }
}

pub(crate) fn require(actual: usize, required: usize) -> IndicatorResult<()> {
    if actual < required {
        return Err(IndicatorError::InsufficientData { required, actual });
    }
    Ok(())
}

pub(crate) fn require_period(name: &str, period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(format!("{name} period must be > 0")));
    }
    Ok(())
}

/// Trims high/low/close columns to their common most recent length and checks
/// that at least `required` samples remain.
pub(crate) fn aligned_tails<'a>(
    highs: &'a [f64],
    lows: &'a [f64],
    closes: &'a [f64],
    required: usize,
) -> IndicatorResult<(&'a [f64], &'a [f64], &'a [f64])> {
    let len = highs.len().min(lows.len()).min(closes.len());
    require(len, required)?;
    Ok((
        &highs[highs.len() - len..],
        &lows[lows.len() - len..],
        &closes[closes.len() - len..],
    ))
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Wilder smoothing: seed with the mean of the first `period` values, then
/// `v[i] = (v[i-1] * (period - 1) + x[i]) / period`.
pub(crate) fn wilder_smooth(values: &[f64], period: usize) -> IndicatorResult<Vec<f64>> {
    require_period("wilder", period)?;
    require(values.len(), period)?;

    let n = period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(mean(&values[..period]));
    for &v in &values[period..] {
        let prev = out[out.len() - 1];
        out.push((prev * (n - 1.0) + v) / n);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wilder_seed_is_simple_mean() {
        let smoothed = wilder_smooth(&[2.0, 4.0, 6.0], 3).unwrap();
        assert_eq!(smoothed, vec![4.0]);
    }

    #[test]
    fn wilder_recursion() {
        let smoothed = wilder_smooth(&[1.0, 1.0, 4.0], 2).unwrap();
        // seed 1.0, then (1.0 * 1 + 4.0) / 2
        assert_eq!(smoothed, vec![1.0, 2.5]);
    }

    #[test]
    fn wilder_short_input() {
        assert_eq!(
            wilder_smooth(&[1.0], 3),
            Err(IndicatorError::InsufficientData {
                required: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn tails_use_common_suffix() {
        let highs = [1.0, 2.0, 3.0];
        let lows = [0.5, 1.5];
        let closes = [9.0, 8.0, 7.0, 6.0];
        let (h, l, c) = aligned_tails(&highs, &lows, &closes, 2).unwrap();
        assert_eq!(h, &[2.0, 3.0]);
        assert_eq!(l, &[0.5, 1.5]);
        assert_eq!(c, &[7.0, 6.0]);
    }
}
