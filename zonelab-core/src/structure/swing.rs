//! Swing detection: symmetric left/right pivot confirmation.
//!
//! Bar `i` is a swing High when `high[i]` is strictly above every one of the
//! `left_bars` highs before it and the `right_bars` highs after it. Swing Lows
//! mirror this on `low[]`. A swing is only confirmed once `right_bars` bars have
//! printed after it, so the scan stops `right_bars` short of the series end.

use serde::{Deserialize, Serialize};

use crate::domain::series::check_len;
use crate::domain::{Ohlcv, Swing, SwingKind};
use crate::error::SeriesError;

/// Pivot window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    pub left_bars: usize,
    pub right_bars: usize,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            left_bars: 2,
            right_bars: 2,
        }
    }
}

impl SwingConfig {
    /// Shortest series that can contain a single swing.
    pub fn min_len(&self) -> usize {
        self.left_bars + self.right_bars + 1
    }
}

/// Find all confirmed swings from raw `high`/`low` columns, sorted by index.
///
/// A bar that is both a swing High and a swing Low yields two entries, High first.
pub fn find_swings(
    high: &[f64],
    low: &[f64],
    config: &SwingConfig,
) -> Result<Vec<Swing>, SeriesError> {
    check_len("low", high.len(), low)?;

    let n = high.len();
    let SwingConfig {
        left_bars,
        right_bars,
    } = *config;
    let mut swings = Vec::new();

    if n < config.min_len() {
        return Ok(swings);
    }

    for i in left_bars..(n - right_bars) {
        let left = i - left_bars..i;
        let right = i + 1..=i + right_bars;

        let neighbours_high = high[left.clone()]
            .iter()
            .chain(&high[right.clone()])
            .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        if high[i] > neighbours_high {
            swings.push(Swing {
                index: i,
                price: high[i],
                kind: SwingKind::High,
            });
        }

        let neighbours_low = low[left]
            .iter()
            .chain(&low[right])
            .fold(f64::INFINITY, |acc, &v| acc.min(v));
        if low[i] < neighbours_low {
            swings.push(Swing {
                index: i,
                price: low[i],
                kind: SwingKind::Low,
            });
        }
    }

    Ok(swings)
}

/// [`find_swings`] over a validated series (lengths already checked).
pub fn find_swings_in(series: &Ohlcv<'_>, config: &SwingConfig) -> Vec<Swing> {
    find_swings(series.high(), series.low(), config).unwrap_or_default()
}
