use super::{
    aligned_tails, require, require_period, wilder_smooth, IndicatorError, IndicatorResult,
};
use ta::indicators::BollingerBands;
use ta::Next;

/// TR = max(high - low, |high - prev_close|, |low - prev_close|)
#[inline]
fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Average True Range over the last `period + 1` samples, Wilder smoothed.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> IndicatorResult<f64> {
    require_period("atr", period)?;
    let (highs, lows, closes) = aligned_tails(highs, lows, closes, period + 1)?;

    let start = closes.len() - (period + 1);
    let tr: Vec<f64> = (start + 1..closes.len())
        .map(|i| true_range(highs[i], lows[i], closes[i - 1]))
        .collect();

    let smoothed = wilder_smooth(&tr, period)?;
    Ok(smoothed[smoothed.len() - 1])
}

/// Average Directional Index over the whole series.
///
/// +DM, -DM and TR are Wilder smoothed, turned into DI/DX, and DX is smoothed
/// once more. Needs `period + 1` samples for the first stage and
/// `2 * period` in total for the final smoothing.
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> IndicatorResult<f64> {
    require_period("adx", period)?;
    let (highs, lows, closes) = aligned_tails(highs, lows, closes, period + 1)?;

    let steps = closes.len() - 1;
    let mut plus_dm = Vec::with_capacity(steps);
    let mut minus_dm = Vec::with_capacity(steps);
    let mut tr = Vec::with_capacity(steps);

    for i in 1..closes.len() {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        tr.push(true_range(highs[i], lows[i], closes[i - 1]));
    }

    let sm_plus = wilder_smooth(&plus_dm, period)?;
    let sm_minus = wilder_smooth(&minus_dm, period)?;
    let sm_tr = wilder_smooth(&tr, period)?;

    let dx: Vec<f64> = sm_plus
        .iter()
        .zip(&sm_minus)
        .zip(&sm_tr)
        .map(|((p, m), t)| {
            let (di_plus, di_minus) = if *t != 0.0 {
                (100.0 * p / t, 100.0 * m / t)
            } else {
                (0.0, 0.0)
            };
            let sum = di_plus + di_minus;
            if sum != 0.0 {
                100.0 * (di_plus - di_minus).abs() / sum
            } else {
                0.0
            }
        })
        .collect();

    let adx = wilder_smooth(&dx, period).map_err(|_| IndicatorError::InsufficientData {
        required: 2 * period,
        actual: closes.len(),
    })?;
    Ok(adx[adx.len() - 1])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Bollinger bands from the mean and population standard deviation of the
/// last `period` closes.
pub fn bollinger(series: &[f64], period: usize, std_dev: f64) -> IndicatorResult<Bollinger> {
    require_period("bollinger", period)?;
    require(series.len(), period)?;

    let mut bands = BollingerBands::new(period, std_dev)
        .map_err(|e| IndicatorError::InvalidPeriod(format!("bollinger({period}): {e:?}")))?;

    let window = &series[series.len() - period..];
    let mut last = None;
    for &price in window {
        last = Some(bands.next(price));
    }

    let out = last.ok_or(IndicatorError::InsufficientData {
        required: period,
        actual: 0,
    })?;
    Ok(Bollinger {
        mid: out.average,
        upper: out.upper,
        lower: out.lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(len: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..len)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 3.0 + i as f64 * 0.2)
            .collect();
        let highs = closes.iter().map(|c| c + 1.0).collect();
        let lows = closes.iter().map(|c| c - 1.0).collect();
        (highs, lows, closes)
    }

    #[test]
    fn true_range_gaps() {
        assert!((true_range(105.0, 95.0, 100.0) - 10.0).abs() < 1e-10);
        assert!((true_range(115.0, 108.0, 100.0) - 15.0).abs() < 1e-10);
        assert!((true_range(92.0, 85.0, 100.0) - 15.0).abs() < 1e-10);
    }

    #[test]
    fn atr_constant_range() {
        let closes = vec![100.0; 20];
        let highs = vec![101.0; 20];
        let lows = vec![99.0; 20];
        let value = atr(&highs, &lows, &closes, 14).unwrap();
        assert!((value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn atr_depends_only_on_the_tail() {
        let (h, l, c) = bars(60);
        let mut other_h = vec![500.0; 10];
        let mut other_l = vec![1.0; 10];
        let mut other_c = vec![250.0; 10];
        other_h.extend_from_slice(&h[45..]);
        other_l.extend_from_slice(&l[45..]);
        other_c.extend_from_slice(&c[45..]);

        let a = atr(&h, &l, &c, 14).unwrap();
        let b = atr(&other_h, &other_l, &other_c, 14).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn atr_insufficient() {
        let (h, l, c) = bars(14);
        assert_eq!(
            atr(&h, &l, &c, 14),
            Err(IndicatorError::InsufficientData {
                required: 15,
                actual: 14
            })
        );
    }

    #[test]
    fn adx_is_deterministic_and_bounded() {
        let (h, l, c) = bars(80);
        let first = adx(&h, &l, &c, 14).unwrap();
        let second = adx(&h, &l, &c, 14).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=100.0).contains(&first));
    }

    #[test]
    fn adx_strong_on_steady_trend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let value = adx(&highs, &lows, &closes, 7).unwrap();
        assert!((value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn adx_needs_two_smoothing_stages() {
        let (h, l, c) = bars(15);
        assert!(matches!(
            adx(&h, &l, &c, 14),
            Err(IndicatorError::InsufficientData { required: 28, .. })
        ));
        let (h, l, c) = bars(28);
        assert!(adx(&h, &l, &c, 14).is_ok());
    }

    #[test]
    fn bollinger_population_std() {
        let series: Vec<f64> = (1..=20).map(f64::from).collect();
        let bands = bollinger(&series, 20, 2.0).unwrap();
        let sd = (399.0_f64 / 12.0).sqrt();
        assert!((bands.mid - 10.5).abs() < 1e-9);
        assert!((bands.upper - (10.5 + 2.0 * sd)).abs() < 1e-9);
        assert!((bands.lower - (10.5 - 2.0 * sd)).abs() < 1e-9);
    }

    #[test]
    fn bollinger_uses_last_window_only() {
        let mut series = vec![1000.0; 30];
        series.extend(std::iter::repeat(10.0).take(20));
        let bands = bollinger(&series, 20, 2.0).unwrap();
        assert!((bands.mid - 10.0).abs() < 1e-9);
        assert!((bands.upper - bands.lower).abs() < 1e-9);
    }

    #[test]
    fn bollinger_needs_a_full_window() {
        let series: Vec<f64> = (1..=19).map(f64::from).collect();
        assert_eq!(
            bollinger(&series, 20, 2.0),
            Err(IndicatorError::InsufficientData {
                required: 20,
                actual: 19
            })
        );
    }
}
