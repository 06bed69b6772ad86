//! EMA-cross forecast for a single symbol.
//!
//! With `d0 = slow[-1] - fast[-1]` (distance still to close) and
//! `v = (fast[-1] - fast[-6]) - (slow[-1] - slow[-6])` (closing speed over
//! five bars):
//!
//! - `d0 <= 0`: already crossed, 0 days
//! - `v <= 0`: diverging, no forecast
//! - otherwise `ceil(d0 / v)` days
//!
//! Score: `clamp(100 - 5*days - 20*(d0/|slow|) + 10*min(3, v/|slow|), 0, 100)`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::series::check_values;
use crate::error::SeriesError;
use crate::indicators::ema_of_series;

/// Bars between the two samples used for the closing speed.
pub const SLOPE_BARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossReason {
    InsufficientData,
    NoConvergence,
    AlreadyCrossed,
    OutOfWindow,
    Ok,
}

impl CrossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossReason::InsufficientData => "INSUFFICIENT_DATA",
            CrossReason::NoConvergence => "NO_CONVERGENCE",
            CrossReason::AlreadyCrossed => "ALREADY_CROSSED",
            CrossReason::OutOfWindow => "OUT_OF_WINDOW",
            CrossReason::Ok => "OK",
        }
    }
}

impl fmt::Display for CrossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Forecasts further out than this are reported as `OUT_OF_WINDOW`.
    pub max_days: u32,
    /// Rows kept after ranking.
    pub top: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 50,
            max_days: 30,
            top: 25,
        }
    }
}

impl ScreenerConfig {
    pub fn new(fast_period: usize, slow_period: usize, max_days: u32, top: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            fast_period < slow_period,
            "fast_period must be less than slow_period"
        );
        Self {
            fast_period,
            slow_period,
            max_days,
            top,
        }
    }

    /// Bars needed before a forecast is attempted.
    pub fn min_bars(&self) -> usize {
        self.slow_period + SLOPE_BARS
    }
}

/// Inputs and result of one cross forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossForecast {
    pub ema_fast: f64,
    pub ema_slow: f64,
    /// `d0`
    pub gap: f64,
    /// `v`
    pub slope_diff: f64,
    pub days: Option<u32>,
}

/// Forecast from precomputed EMA series. `None` when either series has
/// fewer than six values or a NaN in the sampled positions.
pub fn cross_forecast(fast: &[f64], slow: &[f64]) -> Option<CrossForecast> {
    let n = fast.len();
    if n != slow.len() || n <= SLOPE_BARS {
        return None;
    }
    let (f1, f0) = (fast[n - 1], fast[n - 1 - SLOPE_BARS]);
    let (s1, s0) = (slow[n - 1], slow[n - 1 - SLOPE_BARS]);
    if [f1, f0, s1, s0].iter().any(|x| !x.is_finite()) {
        return None;
    }

    let gap = s1 - f1;
    let slope_diff = (f1 - f0) - (s1 - s0);
    let days = if gap <= 0.0 {
        Some(0)
    } else if slope_diff <= 0.0 {
        None
    } else {
        Some((gap / slope_diff).ceil() as u32)
    };

    Some(CrossForecast {
        ema_fast: f1,
        ema_slow: s1,
        gap,
        slope_diff,
        days,
    })
}

/// Days until the fast EMA reaches the slow EMA: `Some(0)` when already
/// crossed, `None` when diverging or when there is nothing to measure.
pub fn forecast_cross_days(fast: &[f64], slow: &[f64]) -> Option<u32> {
    cross_forecast(fast, slow).and_then(|f| f.days)
}

/// Ranking score for a converging pair, in 0..=100.
pub fn cross_score(days: u32, gap: f64, slope_diff: f64, ema_slow: f64) -> f64 {
    let scale = ema_slow.abs();
    let (gap_term, slope_term) = if scale > 0.0 {
        (20.0 * (gap / scale), 10.0 * (slope_diff / scale).min(3.0))
    } else {
        (0.0, 0.0)
    };
    (100.0 - 5.0 * days as f64 - gap_term + slope_term).clamp(0.0, 100.0)
}

/// Reason code and score for a forecast. Only `Ok` scores above zero.
pub fn classify_cross(forecast: &CrossForecast, max_days: u32) -> (CrossReason, f64) {
    match forecast.days {
        None => (CrossReason::NoConvergence, 0.0),
        Some(0) => (CrossReason::AlreadyCrossed, 0.0),
        Some(d) if d > max_days => (CrossReason::OutOfWindow, 0.0),
        Some(d) => (
            CrossReason::Ok,
            cross_score(d, forecast.gap, forecast.slope_diff, forecast.ema_slow),
        ),
    }
}

/// One screener result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    pub symbol: String,
    pub last_close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub gap: f64,
    pub slope_diff: f64,
    pub days_to_cross: Option<u32>,
    pub score: f64,
    pub reason: CrossReason,
}

impl ScreenerRow {
    fn insufficient(symbol: &str, last_close: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            last_close,
            ema_fast: f64::NAN,
            ema_slow: f64::NAN,
            gap: f64::NAN,
            slope_diff: f64::NAN,
            days_to_cross: None,
            score: 0.0,
            reason: CrossReason::InsufficientData,
        }
    }
}

/// Screen one symbol's closes.
///
/// A NaN, infinite or negative close is an error; a history shorter than
/// `min_bars` is an `InsufficientData` row.
pub fn screen_symbol(
    symbol: &str,
    closes: &[f64],
    config: &ScreenerConfig,
) -> Result<ScreenerRow, SeriesError> {
    check_values("close", closes)?;
    let last_close = closes.last().copied().unwrap_or(f64::NAN);
    if closes.len() < config.min_bars() {
        return Ok(ScreenerRow::insufficient(symbol, last_close));
    }

    let fast = ema_of_series(closes, config.fast_period);
    let slow = ema_of_series(closes, config.slow_period);
    let Some(forecast) = cross_forecast(&fast, &slow) else {
        return Ok(ScreenerRow::insufficient(symbol, last_close));
    };
    let (reason, score) = classify_cross(&forecast, config.max_days);

    Ok(ScreenerRow {
        symbol: symbol.to_string(),
        last_close,
        ema_fast: forecast.ema_fast,
        ema_slow: forecast.ema_slow,
        gap: forecast.gap,
        slope_diff: forecast.slope_diff,
        days_to_cross: forecast.days,
        score,
        reason,
    })
}

/// Score descending, then days ascending with no forecast last, then symbol.
pub fn rank_rows(rows: &mut [ScreenerRow]) {
    rows.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| match (a.days_to_cross, b.days_to_cross) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn falling_then_bouncing() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..100).map(|i| 200.0 - i as f64).collect();
        let last = closes[99];
        closes.extend((1..=5).map(|k| last + 2.0 * k as f64));
        closes
    }

    // ── forecast ───────────────────────────────────────────────────

    #[test]
    fn forecast_known_values() {
        let fast = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let slow = [10.0; 6];
        // d0 = 4, v = 5
        assert_eq!(forecast_cross_days(&fast, &slow), Some(1));

        let f = cross_forecast(&fast, &slow).unwrap();
        assert_approx(f.gap, 4.0, DEFAULT_EPSILON);
        assert_approx(f.slope_diff, 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn crossed_is_zero_days() {
        let fast = [11.0, 10.0, 9.0, 8.0, 7.0, 10.0];
        let slow = [10.0; 6];
        assert_eq!(forecast_cross_days(&fast, &slow), Some(0));
    }

    #[test]
    fn diverging_has_no_forecast() {
        let fast = [9.0; 6];
        let slow = [10.0; 6];
        assert_eq!(forecast_cross_days(&fast, &slow), None);
        let fast = [9.0, 9.0, 9.0, 9.0, 9.0, 8.0];
        assert_eq!(forecast_cross_days(&fast, &slow), None);
    }

    #[test]
    fn short_or_nan_series_has_no_forecast() {
        assert_eq!(cross_forecast(&[1.0; 5], &[2.0; 5]), None);
        let mut fast = [1.0; 6];
        fast[0] = f64::NAN;
        assert_eq!(cross_forecast(&fast, &[2.0; 6]), None);
    }

    // ── score and classification ───────────────────────────────────

    #[test]
    fn score_formula() {
        // 100 - 5 - 20 * 0.4 + 10 * 0.5
        assert_approx(cross_score(1, 4.0, 5.0, 10.0), 92.0, DEFAULT_EPSILON);
        // slope term capped at 3
        assert_approx(cross_score(1, 0.0, 100.0, 10.0), 100.0, DEFAULT_EPSILON);
        assert_eq!(cross_score(30, 50.0, 0.1, 10.0), 0.0);
        // zero slow EMA drops the relative terms
        assert_approx(cross_score(2, 1.0, 1.0, 0.0), 90.0, DEFAULT_EPSILON);
    }

    #[test]
    fn classification_codes() {
        let base = CrossForecast {
            ema_fast: 9.0,
            ema_slow: 10.0,
            gap: 1.0,
            slope_diff: 0.5,
            days: Some(2),
        };
        assert_eq!(classify_cross(&base, 30).0, CrossReason::Ok);
        assert_eq!(classify_cross(&base, 1), (CrossReason::OutOfWindow, 0.0));
        let crossed = CrossForecast { days: Some(0), ..base };
        assert_eq!(classify_cross(&crossed, 30), (CrossReason::AlreadyCrossed, 0.0));
        let none = CrossForecast { days: None, ..base };
        assert_eq!(classify_cross(&none, 30), (CrossReason::NoConvergence, 0.0));
    }

    #[test]
    fn reason_codes_serialize_screaming() {
        let json = serde_json::to_string(&CrossReason::InsufficientData).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_DATA\"");
        assert_eq!(CrossReason::NoConvergence.to_string(), "NO_CONVERGENCE");
    }

    // ── screen_symbol ──────────────────────────────────────────────

    #[test]
    fn short_history_is_insufficient() {
        let closes: Vec<f64> = (0..54).map(|i| 100.0 + i as f64).collect();
        let row = screen_symbol("AAA", &closes, &ScreenerConfig::default()).unwrap();
        assert_eq!(row.reason, CrossReason::InsufficientData);
        assert_eq!(row.days_to_cross, None);
        assert_eq!(row.score, 0.0);
        assert_eq!(row.last_close, 153.0);
    }

    #[test]
    fn uptrend_has_already_crossed() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let row = screen_symbol("UP", &closes, &ScreenerConfig::default()).unwrap();
        assert_eq!(row.reason, CrossReason::AlreadyCrossed);
        assert_eq!(row.days_to_cross, Some(0));
        assert!(row.ema_fast > row.ema_slow);
    }

    #[test]
    fn accelerating_decline_does_not_converge() {
        let closes: Vec<f64> = (0..100).map(|i| 200.0 - 0.01 * (i * i) as f64).collect();
        let row = screen_symbol("DOWN", &closes, &ScreenerConfig::default()).unwrap();
        assert_eq!(row.reason, CrossReason::NoConvergence);
        assert_eq!(row.days_to_cross, None);
        assert!(row.slope_diff < 0.0);
    }

    #[test]
    fn bounce_converges_within_window() {
        let closes = falling_then_bouncing();
        let row = screen_symbol("BNC", &closes, &ScreenerConfig::default()).unwrap();
        assert_eq!(row.reason, CrossReason::Ok);
        // d0 ~ 12.9, v ~ 2.1
        assert_eq!(row.days_to_cross, Some(7));
        assert!(row.score > 60.0 && row.score < 65.0);

        let tight = ScreenerConfig {
            max_days: 5,
            ..ScreenerConfig::default()
        };
        let row = screen_symbol("BNC", &closes, &tight).unwrap();
        assert_eq!(row.reason, CrossReason::OutOfWindow);
        assert_eq!(row.days_to_cross, Some(7));
        assert_eq!(row.score, 0.0);
    }

    #[test]
    fn nan_close_is_rejected() {
        let mut closes: Vec<f64> = (0..100).map(|i| 200.0 - i as f64).collect();
        closes[99] = f64::NAN;
        let err = screen_symbol("NAN", &closes, &ScreenerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SeriesError::InvalidValue {
                field: "close",
                index: 99,
                ..
            }
        ));
    }

    #[test]
    fn negative_close_is_rejected() {
        let closes: Vec<f64> = (0..100).map(|i| -100.0 - i as f64).collect();
        let err = screen_symbol("NEG", &closes, &ScreenerConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SeriesError::InvalidValue {
                field: "close",
                index: 0,
                value: -100.0
            }
        );

        // short histories are still validated
        let err = screen_symbol("NEG", &[10.0, -1.0], &ScreenerConfig::default()).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidValue { index: 1, .. }));
    }

    // ── ranking ────────────────────────────────────────────────────

    #[test]
    fn ranking_order() {
        let row = |symbol: &str, score: f64, days: Option<u32>| ScreenerRow {
            score,
            days_to_cross: days,
            ..ScreenerRow::insufficient(symbol, 1.0)
        };
        let mut rows = vec![
            row("D", 0.0, None),
            row("C", 0.0, Some(0)),
            row("B", 80.0, Some(4)),
            row("A", 80.0, Some(2)),
            row("E", 90.0, Some(9)),
        ];
        rank_rows(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["E", "A", "B", "C", "D"]);
    }

    #[test]
    #[should_panic(expected = "fast_period must be less than slow_period")]
    fn rejects_inverted_periods() {
        ScreenerConfig::new(50, 20, 30, 25);
    }
}
