//! Fair value gaps: body-based imbalance across a 3-candle window.
//!
//! For the window ending at `i`, candle `i` is compared with candle `i-2`; the
//! middle candle is the displacement and is skipped.
//!
//! - Buy:  `body_low(i) > body_high(i-2)`, gap = `[body_high(i-2), body_low(i)]`
//! - Sell: `body_high(i) < body_low(i-2)`, gap = `[body_high(i), body_low(i-2)]`
//!
//! Equal bodies produce no gap, so `gap_high > gap_low` always holds.
//!
//! A gap stays fresh until a later bar's range has filled more than
//! `mitigation_fraction` of it.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Fvg, Ohlcv, ZoneSide};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FvgConfig {
    /// Fraction of the gap (0..=1) a later bar may fill before the gap is
    /// considered mitigated. Filling exactly this fraction keeps it fresh.
    pub mitigation_fraction: f64,
}

impl Default for FvgConfig {
    fn default() -> Self {
        Self {
            mitigation_fraction: 0.5,
        }
    }
}

/// The gap formed by the window ending at `i`, if any.
pub fn fvg_at(series: &Ohlcv<'_>, i: usize) -> Option<Fvg> {
    if i < 2 || i >= series.len() {
        return None;
    }
    let first = series.candle(i - 2);
    let third = series.candle(i);

    if third.body_low() > first.body_high() {
        Some(Fvg {
            index: i,
            direction: ZoneSide::Buy,
            gap_high: third.body_low(),
            gap_low: first.body_high(),
        })
    } else if third.body_high() < first.body_low() {
        Some(Fvg {
            index: i,
            direction: ZoneSide::Sell,
            gap_high: first.body_low(),
            gap_low: third.body_high(),
        })
    } else {
        None
    }
}

/// Share of the gap (0..=1) that `bar`'s range reaches into.
///
/// Buy gaps fill from the top down (price returning lower); Sell gaps fill
/// from the bottom up.
pub fn fill_fraction(fvg: &Fvg, bar: &Candle) -> f64 {
    let size = fvg.size();
    if size <= 0.0 {
        return 1.0;
    }
    let penetration = match fvg.direction {
        ZoneSide::Buy => fvg.gap_high - bar.low,
        ZoneSide::Sell => bar.high - fvg.gap_low,
    };
    (penetration / size).clamp(0.0, 1.0)
}

/// True when no bar after the gap, up to and including `current_index`,
/// has filled more than `config.mitigation_fraction` of it.
pub fn is_fvg_fresh(
    fvg: &Fvg,
    series: &Ohlcv<'_>,
    current_index: usize,
    config: &FvgConfig,
) -> bool {
    let end = current_index.saturating_add(1).min(series.len());
    ((fvg.index + 1)..end)
        .all(|j| fill_fraction(fvg, &series.candle(j)) <= config.mitigation_fraction)
}

/// Every gap in the series, ascending by index. With `fresh_only`, gaps
/// mitigated before the series end are dropped.
pub fn find_fvgs(series: &Ohlcv<'_>, config: &FvgConfig, fresh_only: bool) -> Vec<Fvg> {
    let last = series.len().saturating_sub(1);
    (2..series.len())
        .filter_map(|i| fvg_at(series, i))
        .filter(|fvg| !fresh_only || is_fvg_fresh(fvg, series, last, config))
        .collect()
}

/// Most recent gap regardless of mitigation.
pub fn latest_fvg(series: &Ohlcv<'_>) -> Option<Fvg> {
    (2..series.len()).rev().find_map(|i| fvg_at(series, i))
}

/// Most recent unmitigated gap, if any.
pub fn latest_fresh_fvg(series: &Ohlcv<'_>, config: &FvgConfig) -> Option<Fvg> {
    let last = series.len().checked_sub(1)?;
    (2..series.len())
        .rev()
        .filter_map(|i| fvg_at(series, i))
        .find(|fvg| is_fvg_fresh(fvg, series, last, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Columns;

    fn buy_gap() -> Columns {
        // body_high(0) = 11.5, body_low(2) = 13.0
        Columns::from_bodies(&[(11.0, 11.5), (11.6, 13.4), (13.0, 13.8)], 0.1)
    }

    #[test]
    fn buy_gap_between_first_and_third_bodies() {
        let cols = buy_gap();
        let fvg = fvg_at(&cols.view(), 2).unwrap();
        assert_eq!(fvg.direction, ZoneSide::Buy);
        assert_eq!(fvg.gap_low, 11.5);
        assert_eq!(fvg.gap_high, 13.0);
        assert_eq!(fvg.index, 2);
    }

    #[test]
    fn sell_gap_mirrors_buy() {
        let cols = Columns::from_bodies(&[(20.0, 19.0), (18.9, 16.5), (16.8, 16.0)], 0.1);
        let fvg = fvg_at(&cols.view(), 2).unwrap();
        assert_eq!(fvg.direction, ZoneSide::Sell);
        assert_eq!(fvg.gap_high, 19.0);
        assert_eq!(fvg.gap_low, 16.8);
    }

    #[test]
    fn touching_bodies_are_not_a_gap() {
        let cols = Columns::from_bodies(&[(11.0, 11.5), (11.5, 13.0), (11.5, 12.0)], 0.1);
        assert_eq!(fvg_at(&cols.view(), 2), None);
    }

    #[test]
    fn out_of_range_windows() {
        let cols = buy_gap();
        assert_eq!(fvg_at(&cols.view(), 1), None);
        assert_eq!(fvg_at(&cols.view(), 3), None);
    }

    #[test]
    fn fill_fraction_clamps() {
        let fvg = Fvg {
            index: 2,
            direction: ZoneSide::Buy,
            gap_high: 13.0,
            gap_low: 11.0,
        };
        let bar = |low: f64| Candle {
            open: 14.0,
            high: 14.5,
            low,
            close: 14.2,
            volume: 0.0,
        };
        assert_eq!(fill_fraction(&fvg, &bar(13.5)), 0.0);
        assert_eq!(fill_fraction(&fvg, &bar(12.0)), 0.5);
        assert_eq!(fill_fraction(&fvg, &bar(10.0)), 1.0);
    }

    #[test]
    fn mitigation_threshold_is_strict() {
        let mut cols = buy_gap();
        // Gap [11.5, 13.0], size 1.5. Low of 12.25 fills exactly half.
        cols.push(13.5, 13.9, 12.25, 13.6, 1000.0);
        let series = cols.view();
        let fvg = fvg_at(&series, 2).unwrap();
        assert!(is_fvg_fresh(&fvg, &series, 3, &FvgConfig::default()));

        cols.push(13.6, 13.7, 12.0, 13.1, 1000.0);
        let series = cols.view();
        assert!(!is_fvg_fresh(&fvg, &series, 4, &FvgConfig::default()));
        // Freshness is relative to the caller's current bar.
        assert!(is_fvg_fresh(&fvg, &series, 3, &FvgConfig::default()));
    }

    #[test]
    fn enumeration_filters_mitigated() {
        let mut cols = buy_gap();
        cols.push(13.3, 13.9, 11.0, 13.6, 1000.0); // full fill
        let series = cols.view();
        let all = find_fvgs(&series, &FvgConfig::default(), false);
        assert_eq!(all.len(), 1);
        assert!(find_fvgs(&series, &FvgConfig::default(), true).is_empty());
        assert_eq!(latest_fresh_fvg(&series, &FvgConfig::default()), None);
        assert_eq!(latest_fvg(&series).map(|g| g.index), Some(2));
    }

    #[test]
    fn latest_fresh_prefers_newest() {
        let cols = Columns::from_bodies(
            &[
                (10.0, 10.5),
                (10.6, 11.5),
                (11.0, 12.0), // gap at 2: [10.5, 11.0]
                (12.1, 13.5), // gap at 3: [11.5, 12.1]
                (13.0, 14.0), // gap at 4: [12.0, 13.0]
            ],
            0.05,
        );
        let series = cols.view();
        let latest = latest_fresh_fvg(&series, &FvgConfig::default()).unwrap();
        assert_eq!(latest.index, 4);
        assert_eq!(find_fvgs(&series, &FvgConfig::default(), true).len(), 3);
    }
}
