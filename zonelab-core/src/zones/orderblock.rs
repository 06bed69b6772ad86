//! Order block detection.
//!
//! A candle is a *displacement* when its body is at least
//! `displacement_threshold` times the median body of the `lookback` candles
//! before it (any non-zero body counts when there is no history). A bullish
//! displacement whose body fully contains the body of the bearish candle right
//! before it marks a Buy order block on that bearish candle; the Sell case
//! mirrors colors. The zone is the engulfed candle's body, never its wicks.
//!
//! When the candle after the displacement completes a same-direction fair
//! value gap (window `i-1, i, i+1`), that gap is attached to the block.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::{Ohlcv, OrderBlock, ZoneSide};
use crate::indicators::median;
use crate::zones::freshness::is_orderblock_fresh;
use crate::zones::fvg::fvg_at;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBlockConfig {
    /// Body multiple of the trailing median required for displacement.
    pub displacement_threshold: f64,
    /// Number of candles before the displacement used for the median.
    pub lookback: usize,
}

impl Default for OrderBlockConfig {
    fn default() -> Self {
        Self {
            displacement_threshold: 1.5,
            lookback: 20,
        }
    }
}

impl OrderBlockConfig {
    pub fn new(displacement_threshold: f64, lookback: usize) -> Self {
        assert!(
            displacement_threshold.is_finite() && displacement_threshold > 0.0,
            "displacement_threshold must be a positive finite number"
        );
        assert!(lookback >= 1, "lookback must be >= 1");
        Self {
            displacement_threshold,
            lookback,
        }
    }
}

/// Median body of the `lookback` candles ending just before `i`.
pub fn trailing_median_body(series: &Ohlcv<'_>, i: usize, lookback: usize) -> Option<f64> {
    let start = i.saturating_sub(lookback);
    let bodies: Vec<f64> = (start..i.min(series.len()))
        .map(|j| series.candle(j).body())
        .collect();
    median(&bodies)
}

/// Displacement test for candle `i` (`>=`, so a body of exactly
/// `threshold * median` qualifies).
pub fn is_displacement(series: &Ohlcv<'_>, i: usize, config: &OrderBlockConfig) -> bool {
    if i >= series.len() {
        return false;
    }
    let body = series.candle(i).body();
    match trailing_median_body(series, i, config.lookback) {
        Some(med) => body >= config.displacement_threshold * med,
        None => body > 0.0,
    }
}

/// Side of the order block candle `i` would create by engulfing `i-1`,
/// ignoring displacement strength.
pub fn engulfing_side(series: &Ohlcv<'_>, i: usize) -> Option<ZoneSide> {
    if i == 0 || i >= series.len() {
        return None;
    }
    let prev = series.candle(i - 1);
    let cur = series.candle(i);
    let contains = cur.body_high() >= prev.body_high() && cur.body_low() <= prev.body_low();
    if !contains {
        return None;
    }
    if cur.is_bullish() && prev.is_bearish() {
        Some(ZoneSide::Buy)
    } else if cur.is_bearish() && prev.is_bullish() {
        Some(ZoneSide::Sell)
    } else {
        None
    }
}

/// Structurally valid order block with displacement at `i`, ignoring freshness.
pub fn orderblock_at(
    series: &Ohlcv<'_>,
    i: usize,
    config: &OrderBlockConfig,
) -> Option<OrderBlock> {
    let direction = engulfing_side(series, i)?;
    if !is_displacement(series, i, config) {
        return None;
    }

    let engulfed = series.candle(i - 1);
    let fvg = fvg_at(series, i + 1).filter(|g| g.direction == direction);

    Some(OrderBlock {
        index: i - 1,
        direction,
        zone_top: engulfed.body_high(),
        zone_bottom: engulfed.body_low(),
        displacement_index: i,
        has_fvg: fvg.is_some(),
        fvg,
    })
}

/// Every structurally valid order block, ascending by index.
///
/// With `fresh_only`, blocks touched by any bar after their displacement
/// candle (through the end of the series) are dropped.
pub fn find_all_orderblocks(
    series: &Ohlcv<'_>,
    config: &OrderBlockConfig,
    fresh_only: bool,
) -> Vec<OrderBlock> {
    let last = series.len().saturating_sub(1);
    (1..series.len())
        .filter_map(|i| orderblock_at(series, i, config))
        .filter(|ob| !fresh_only || is_orderblock_fresh(ob, series, last))
        .collect()
}

/// The single best fresh order block for the series as it stands.
///
/// Among fresh candidates the most recent displacement wins; ties go to the
/// zone whose midpoint is closest to the last close.
pub fn detect_orderblock(series: &Ohlcv<'_>, config: &OrderBlockConfig) -> Option<OrderBlock> {
    let last_close = series.last_close()?;
    let candidates = find_all_orderblocks(series, config, true);
    pick_best(&candidates, last_close)
}

pub(crate) fn pick_best(candidates: &[OrderBlock], last_close: f64) -> Option<OrderBlock> {
    candidates
        .iter()
        .max_by(|a, b| {
            a.displacement_index.cmp(&b.displacement_index).then_with(|| {
                let da = (a.midpoint() - last_close).abs();
                let db = (b.midpoint() - last_close).abs();
                // smaller distance ranks higher
                db.partial_cmp(&da).unwrap_or(Ordering::Equal)
            })
        })
        .copied()
}
