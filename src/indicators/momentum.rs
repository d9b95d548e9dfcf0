use super::moving_average::ema;
use super::{aligned_tails, mean, require, require_period, IndicatorResult, Reading};

/// Lower bound for the average loss in RSI, keeps RS finite on pure uptrends.
const RSI_LOSS_FLOOR: f64 = 1e-12;

/// CCI scaling constant (Lambert).
const CCI_CONSTANT: f64 = 0.015;

/// Relative Strength Index using the simple mean of the last `period` gains and
/// losses (no Wilder recursion).
pub fn rsi(series: &[f64], period: usize) -> IndicatorResult<f64> {
    require_period("rsi", period)?;
    require(series.len(), period.max(2))?;

    let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len().saturating_sub(period)..];

    let avg_gain = mean(&recent.iter().map(|d| d.max(0.0)).collect::<Vec<_>>());
    let avg_loss = mean(&recent.iter().map(|d| (-d).max(0.0)).collect::<Vec<_>>());
    let rs = avg_gain / avg_loss.max(RSI_LOSS_FLOOR);

    Ok(100.0 - 100.0 / (1.0 + rs))
}

#[derive(Debug, Clone, Copy)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    /// Zero until the MACD line holds at least `signal` entries.
    pub signal: f64,
}

/// MACD over the most recent `slow` samples.
///
/// The computed MACD value is appended to `macd_line`, which the caller owns
/// and keeps across ticks; the signal line is an EMA over it.
pub fn macd(series: &[f64], macd_line: &mut Vec<f64>, params: MacdParams) -> IndicatorResult<Macd> {
    require_period("macd slow", params.slow)?;
    require_period("macd signal", params.signal)?;
    require(series.len(), params.slow)?;

    let window = &series[series.len() - params.slow..];
    let value = ema(window, params.fast)? - ema(window, params.slow)?;
    macd_line.push(value);

    let signal = if macd_line.len() >= params.signal {
        ema(macd_line, params.signal)?
    } else {
        0.0
    };

    Ok(Macd {
        macd: value,
        signal,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    /// `None` until `d_period` trailing %K windows are available.
    pub d: Option<f64>,
}

fn percent_k(highs: &[f64], lows: &[f64], close: f64) -> f64 {
    let highest = highs.iter().copied().fold(f64::MIN, f64::max);
    let lowest = lows.iter().copied().fold(f64::MAX, f64::min);
    let range = highest - lowest;
    if range == 0.0 {
        return 0.0;
    }
    100.0 * (close - lowest) / range
}

/// Stochastic oscillator. A zero high-low range yields %K = 0.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> IndicatorResult<Stochastic> {
    require_period("stochastic %K", k_period)?;
    let (highs, lows, closes) = aligned_tails(highs, lows, closes, k_period)?;
    let len = closes.len();

    let k_at = |end: usize| {
        let start = end - k_period;
        percent_k(&highs[start..end], &lows[start..end], closes[end - 1])
    };

    let k = k_at(len);
    let k_values: Vec<f64> = (0..d_period)
        .filter(|&lag| len >= k_period + lag)
        .map(|lag| k_at(len - lag))
        .collect();

    let d = if d_period > 0 && k_values.len() == d_period {
        Some(mean(&k_values))
    } else {
        None
    };

    Ok(Stochastic { k, d })
}

/// Commodity Channel Index over typical prices.
///
/// When every typical price in the window is identical the mean deviation is
/// zero and the index is undefined; that case is reported as
/// `Reading::Degenerate(0.0)`.
pub fn cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> IndicatorResult<Reading> {
    require_period("cci", period)?;
    let (highs, lows, closes) = aligned_tails(highs, lows, closes, period)?;

    let typical: Vec<f64> = highs
        .iter()
        .zip(lows)
        .zip(closes)
        .map(|((h, l), c)| (h + l + c) / 3.0)
        .collect();
    let window = &typical[typical.len() - period..];
    let sma = mean(window);
    let mean_dev = window.iter().map(|tp| (tp - sma).abs()).sum::<f64>() / period as f64;

    if mean_dev == 0.0 {
        return Ok(Reading::Degenerate(0.0));
    }
    let last = window[window.len() - 1];
    Ok(Reading::Value((last - sma) / (CCI_CONSTANT * mean_dev)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorError;

    fn zigzag(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn rsi_bounds() {
        for len in 14..80 {
            let value = rsi(&zigzag(len), 14).unwrap();
            assert!((0.0..=100.0).contains(&value), "rsi {value} out of range");
        }
    }

    #[test]
    fn rsi_extremes() {
        let rising: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert!(rsi(&rising, 14).unwrap() > 99.9);
        assert!(rsi(&falling, 14).unwrap() < 0.1);
    }

    #[test]
    fn rsi_simple_mean_of_last_period() {
        // Deltas: +2, -1, +2, -1 -> avg gain 1.0, avg loss 0.5, RS 2
        let value = rsi(&[10.0, 12.0, 11.0, 13.0, 12.0], 4).unwrap();
        assert!((value - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn rsi_insufficient() {
        assert!(matches!(
            rsi(&[1.0; 13], 14),
            Err(IndicatorError::InsufficientData { required: 14, actual: 13 })
        ));
    }

    #[test]
    fn macd_appends_to_line_and_waits_for_signal() {
        let prices = zigzag(40);
        let mut line = Vec::new();
        let params = MacdParams::default();

        for end in 26..34 {
            let out = macd(&prices[..end], &mut line, params).unwrap();
            assert_eq!(out.signal, 0.0);
        }
        assert_eq!(line.len(), 8);

        let out = macd(&prices[..34], &mut line, params).unwrap();
        assert_eq!(line.len(), 9);
        assert!(out.signal != 0.0);
        assert!(out.macd.is_finite() && out.signal.is_finite());
    }

    #[test]
    fn macd_insufficient_leaves_line_untouched() {
        let mut line = vec![];
        assert!(macd(&[1.0; 25], &mut line, MacdParams::default()).is_err());
        assert!(line.is_empty());
    }

    #[test]
    fn macd_positive_on_rising_prices() {
        let rising: Vec<f64> = (0..26).map(|i| 100.0 + i as f64).collect();
        let mut line = Vec::new();
        let out = macd(&rising, &mut line, MacdParams::default()).unwrap();
        assert!(out.macd > 0.0);
    }

    #[test]
    fn stochastic_k_bounds_and_d() {
        let closes = zigzag(40);
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        let out = stochastic(&highs, &lows, &closes, 14, 3).unwrap();
        assert!((0.0..=100.0).contains(&out.k));
        let d = out.d.unwrap();
        assert!((0.0..=100.0).contains(&d));
    }

    #[test]
    fn stochastic_without_enough_windows_for_d() {
        let closes = zigzag(15);
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        let out = stochastic(&highs, &lows, &closes, 14, 3).unwrap();
        assert!(out.d.is_none());
    }

    #[test]
    fn stochastic_flat_range_is_zero() {
        let flat = [50.0; 20];
        let out = stochastic(&flat, &flat, &flat, 14, 3).unwrap();
        assert_eq!(out.k, 0.0);
        assert_eq!(out.d, Some(0.0));
    }

    #[test]
    fn stochastic_close_at_high() {
        let closes: Vec<f64> = (0..14).map(|i| i as f64).collect();
        let out = stochastic(&closes, &closes, &closes, 14, 3).unwrap();
        assert!((out.k - 100.0).abs() < 1e-12);
    }

    #[test]
    fn cci_degenerate_on_flat_prices() {
        let flat = [10.0; 25];
        assert_eq!(cci(&flat, &flat, &flat, 20), Ok(Reading::Degenerate(0.0)));
    }

    #[test]
    fn cci_sign_follows_last_typical_price() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let reading = cci(&highs, &lows, &closes, 20).unwrap();
        assert!(!reading.is_degenerate());
        assert!(reading.value() > 0.0);
    }

    #[test]
    fn cci_insufficient() {
        let short = [1.0; 19];
        assert!(cci(&short, &short, &short, 20).is_err());
    }

    #[test]
    fn stochastic_needs_k_period_bars() {
        let closes = zigzag(13);
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        assert_eq!(
            stochastic(&highs, &lows, &closes, 14, 3),
            Err(IndicatorError::InsufficientData {
                required: 14,
                actual: 13
            })
        );
    }
}
