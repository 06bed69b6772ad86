//! Detected structures: swings, breaks of structure, fair value gaps, order blocks.
//!
//! All of these are plain values derived from a series slice. They are
//! recomputed on every call and never updated in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extreme a swing marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
}

impl Swing {
    /// Bar at which this swing becomes confirmed for a given right window.
    pub fn confirmed_at(&self, right_bars: usize) -> usize {
        self.index + right_bars
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BosDirection {
    Bullish,
    Bearish,
}

impl fmt::Display for BosDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BosDirection::Bullish => write!(f, "Bullish"),
            BosDirection::Bearish => write!(f, "Bearish"),
        }
    }
}

/// A close beyond the latest confirmed swing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bos {
    pub index: usize,
    pub direction: BosDirection,
    pub broken_swing: Swing,
    pub close_price: f64,
}

/// Side of a zone or gap. Buy = demand (below price), Sell = supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneSide {
    Buy,
    Sell,
}

impl fmt::Display for ZoneSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneSide::Buy => write!(f, "Buy"),
            ZoneSide::Sell => write!(f, "Sell"),
        }
    }
}

/// Body-based three-candle imbalance. `index` is the third candle.
///
/// Invariant: `gap_high > gap_low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fvg {
    pub index: usize,
    pub direction: ZoneSide,
    pub gap_high: f64,
    pub gap_low: f64,
}

impl Fvg {
    pub fn size(&self) -> f64 {
        self.gap_high - self.gap_low
    }

    pub fn midpoint(&self) -> f64 {
        (self.gap_high + self.gap_low) / 2.0
    }
}

/// Supply/demand zone anchored to the engulfed candle's body.
///
/// Invariant: `zone_top >= zone_bottom`, both taken from open/close of the
/// candle at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub index: usize,
    pub direction: ZoneSide,
    pub zone_top: f64,
    pub zone_bottom: f64,
    pub displacement_index: usize,
    pub has_fvg: bool,
    pub fvg: Option<Fvg>,
}

impl OrderBlock {
    pub fn midpoint(&self) -> f64 {
        (self.zone_top + self.zone_bottom) / 2.0
    }

    pub fn height(&self) -> f64 {
        self.zone_top - self.zone_bottom
    }

    /// Distance from `price` to the nearest zone edge; 0 inside the zone.
    pub fn distance_to(&self, price: f64) -> f64 {
        interval_distance(self.zone_top, self.zone_bottom, price)
    }
}

/// Distance from `price` to the closed interval `[bottom, top]`.
pub(crate) fn interval_distance(top: f64, bottom: f64, price: f64) -> f64 {
    if price > top {
        price - top
    } else if price < bottom {
        bottom - price
    } else {
        0.0
    }
}
