//! Zone freshness: has price come back to the zone since it formed?
//!
//! A bar invalidates a zone iff `bar_low <= zone_top && bar_high >= zone_bottom`
//! (closed intervals, so touching an edge counts). Freshness is never stored on
//! a zone; it is always evaluated against a caller-chosen bar range.

use crate::domain::series::check_len;
use crate::domain::{Ohlcv, OrderBlock};
use crate::error::SeriesError;

/// Closed-interval overlap of `[a_bottom, a_top]` and `[b_bottom, b_top]`.
pub fn zones_intersect(a_top: f64, a_bottom: f64, b_top: f64, b_bottom: f64) -> bool {
    b_bottom <= a_top && b_top >= a_bottom
}

/// True when no bar in `[from, to)` touches `[zone_bottom, zone_top]`.
///
/// `to` is clamped to the series length; an empty range is fresh. `high` and
/// `low` must have equal lengths.
pub fn is_zone_fresh(
    zone_top: f64,
    zone_bottom: f64,
    high: &[f64],
    low: &[f64],
    from: usize,
    to: usize,
) -> Result<bool, SeriesError> {
    Ok(first_touch(zone_top, zone_bottom, high, low, from, to)?.is_none())
}

/// First bar in `[from, to)` that touches the zone.
pub fn first_touch(
    zone_top: f64,
    zone_bottom: f64,
    high: &[f64],
    low: &[f64],
    from: usize,
    to: usize,
) -> Result<Option<usize>, SeriesError> {
    check_len("low", high.len(), low)?;
    Ok(scan(zone_top, zone_bottom, high, low, from, to))
}

// high and low are known to be the same length here
fn scan(
    zone_top: f64,
    zone_bottom: f64,
    high: &[f64],
    low: &[f64],
    from: usize,
    to: usize,
) -> Option<usize> {
    let to = to.min(high.len());
    (from..to).find(|&i| zones_intersect(zone_top, zone_bottom, high[i], low[i]))
}

/// Order block freshness as of `current_index` (inclusive).
///
/// Bars after the displacement candle are checked; the displacement candle
/// itself always overlaps the zone it engulfs.
pub fn is_orderblock_fresh(ob: &OrderBlock, series: &Ohlcv<'_>, current_index: usize) -> bool {
    scan(
        ob.zone_top,
        ob.zone_bottom,
        series.high(),
        series.low(),
        ob.displacement_index + 1,
        current_index.saturating_add(1),
    )
    .is_none()
}
