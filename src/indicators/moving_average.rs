use super::{mean, require, require_period, IndicatorError, IndicatorResult};
use crate::types::Trend;
use ta::indicators::StandardDeviation;
use ta::Next;

/// Exponential moving average over the whole series, seeded with its first
/// element, smoothing factor `2 / (period + 1)`. Returns the last value.
///
/// The update is written as `prev + alpha * (x - prev)` so a constant series
/// stays exactly constant, which the sideways trend check relies on.
pub fn ema(series: &[f64], period: usize) -> IndicatorResult<f64> {
    require_period("ema", period)?;
    require(series.len(), period)?;

    let alpha = 2.0 / (period as f64 + 1.0);
    let (&seed, rest) = series
        .split_first()
        .ok_or(IndicatorError::InsufficientData {
            required: period,
            actual: 0,
        })?;
    Ok(rest
        .iter()
        .fold(seed, |prev, &price| prev + alpha * (price - prev)))
}

/// Classifies the trend by comparing a fast and a slow EMA over the last
/// `slow` samples.
pub fn trend_direction(series: &[f64], fast: usize, slow: usize) -> IndicatorResult<Trend> {
    require_period("trend", slow)?;
    require(series.len(), slow)?;

    let window = &series[series.len() - slow..];
    let fast_ema = ema(window, fast)?;
    let slow_ema = ema(window, slow)?;

    Ok(if fast_ema > slow_ema {
        Trend::Uptrend
    } else if fast_ema < slow_ema {
        Trend::Downtrend
    } else {
        Trend::Sideways
    })
}

/// True when the coefficient of variation of the last `window` samples is
/// below `threshold`. Too little data, or a zero mean, is never flat.
pub fn is_flat_market(series: &[f64], window: usize, threshold: f64) -> bool {
    if window == 0 || series.len() < window {
        return false;
    }
    let Ok(mut sd) = StandardDeviation::new(window) else {
        return false;
    };

    let recent = &series[series.len() - window..];
    let std_dev = recent.iter().fold(0.0, |_, &price| sd.next(price));
    let avg = mean(recent);
    if avg == 0.0 {
        return false;
    }
    std_dev / avg < threshold
}
