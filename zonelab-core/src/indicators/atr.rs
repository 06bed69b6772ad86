//! Average True Range (ATR), Wilder-smoothed.
//!
//! TR[t] = max(high-low, |high-prev_close|, |low-prev_close|); TR[0] has no
//! previous close and is excluded from the seed, so the first ATR value lands
//! at index `period`.

use crate::domain::series::check_len;
use crate::domain::Ohlcv;
use crate::error::SeriesError;

/// True range per bar. `tr[0]` is plain high - low.
///
/// `low` and `close` must match `high` in length.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, SeriesError> {
    check_len("low", high.len(), low)?;
    check_len("close", high.len(), close)?;
    Ok(ranges(high, low, close))
}

fn ranges(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len();
    let mut tr = Vec::with_capacity(n);
    for i in 0..n {
        let range = high[i] - low[i];
        if i == 0 {
            tr.push(range);
            continue;
        }
        let pc = close[i - 1];
        tr.push(range.max((high[i] - pc).abs()).max((low[i] - pc).abs()));
    }
    tr
}

/// Wilder smoothing (alpha = 1/period) seeded with the mean of the first
/// run of `period` consecutive non-NaN values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut run = 0;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            continue;
        }
        run += 1;
        if run == period {
            seed_end = Some(i + 1);
            break;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let seed = values[seed_end - period..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}

/// ATR series for a validated OHLCV view.
pub fn atr(series: &Ohlcv<'_>, period: usize) -> Vec<f64> {
    assert!(period >= 1, "ATR period must be >= 1");
    let mut tr = ranges(series.high(), series.low(), series.close());
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }
    wilder_smooth(&tr, period)
}

/// Latest finite ATR value, if the series is long enough to have one.
pub fn latest_atr(series: &Ohlcv<'_>, period: usize) -> Option<f64> {
    atr(series, period)
        .last()
        .copied()
        .filter(|v| v.is_finite())
}
