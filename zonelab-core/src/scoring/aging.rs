//! Zone aging and the volumatic score.
//!
//! Derived against a caller-supplied current bar, never stored on the zone:
//! - `age_candles = current_index - displacement_index`
//! - `age_status`: Fresh below `fresh_max_candles`, Mature up to
//!   `mature_max_candles`, Aged beyond
//! - `fvg_fresh`: the attached gap is still unmitigated at the current bar
//! - `volume_ratio`: displacement volume over the trailing average volume
//!
//! The score is a saturating weighted sum clamped to 0..=100. With validated weights
//! (`fresh >= mature >= aged`, non-negative volume terms) it is monotonic:
//! a younger zone or a heavier displacement never scores lower.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Ohlcv, OrderBlock};
use crate::indicators::mean;
use crate::zones::fvg::{is_fvg_fresh, FvgConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeStatus {
    Fresh,
    Mature,
    Aged,
}

impl AgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeStatus::Fresh => "Fresh",
            AgeStatus::Mature => "Mature",
            AgeStatus::Aged => "Aged",
        }
    }
}

impl fmt::Display for AgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score contributions. Integers are score points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingWeights {
    pub fresh: u32,
    pub mature: u32,
    pub aged: u32,
    pub fvg_fresh: u32,
    /// Points per unit of volume ratio.
    pub volume_per_ratio: f64,
    /// Ceiling on volume points.
    pub volume_cap: u32,
}

impl Default for AgingWeights {
    fn default() -> Self {
        Self {
            fresh: 40,
            mature: 25,
            aged: 10,
            fvg_fresh: 20,
            volume_per_ratio: 20.0,
            volume_cap: 40,
        }
    }
}

impl AgingWeights {
    pub fn is_monotonic(&self) -> bool {
        self.fresh >= self.mature
            && self.mature >= self.aged
            && self.volume_per_ratio.is_finite()
            && self.volume_per_ratio >= 0.0
    }

    fn age_points(&self, status: AgeStatus) -> u32 {
        match status {
            AgeStatus::Fresh => self.fresh,
            AgeStatus::Mature => self.mature,
            AgeStatus::Aged => self.aged,
        }
    }

    fn volume_points(&self, ratio: f64) -> f64 {
        (ratio.max(0.0) * self.volume_per_ratio).min(self.volume_cap as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingConfig {
    pub fresh_max_candles: usize,
    pub mature_max_candles: usize,
    /// Bars before the displacement averaged for the volume ratio.
    pub volume_lookback: usize,
    pub weights: AgingWeights,
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            fresh_max_candles: 10,
            mature_max_candles: 30,
            volume_lookback: 20,
            weights: AgingWeights::default(),
        }
    }
}

impl AgingConfig {
    pub fn age_status(&self, age_candles: usize) -> AgeStatus {
        if age_candles < self.fresh_max_candles {
            AgeStatus::Fresh
        } else if age_candles <= self.mature_max_candles {
            AgeStatus::Mature
        } else {
            AgeStatus::Aged
        }
    }

    /// Combine the three inputs into the bounded score.
    pub fn volumatic_score(&self, status: AgeStatus, fvg_fresh: bool, volume_ratio: f64) -> u8 {
        let w = &self.weights;
        let fvg = if fvg_fresh { w.fvg_fresh } else { 0 };
        let points = w.age_points(status).saturating_add(fvg);
        let total = points as f64 + w.volume_points(volume_ratio);
        total.round().clamp(0.0, 100.0) as u8
    }
}

/// Derived display fields for one zone as of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneAging {
    pub age_candles: usize,
    pub age_status: AgeStatus,
    pub fvg_fresh: bool,
    pub volume_ratio: f64,
    pub volumatic_score: u8,
}

/// Displacement volume over the mean of the `lookback` volumes before it.
///
/// Neutral (1.0) when the series carries no volume, there is no history, or
/// the history averages to zero.
pub fn volume_ratio(series: &Ohlcv<'_>, displacement_index: usize, lookback: usize) -> f64 {
    let Some(volume) = series.volume() else {
        return 1.0;
    };
    if displacement_index >= volume.len() {
        return 1.0;
    }
    let start = displacement_index.saturating_sub(lookback);
    match mean(&volume[start..displacement_index]) {
        Some(avg) if avg > 0.0 => volume[displacement_index] / avg,
        _ => 1.0,
    }
}

/// Age, FVG freshness, volume ratio and score for `ob` as of `current_index`.
pub fn score_zone(
    ob: &OrderBlock,
    series: &Ohlcv<'_>,
    current_index: usize,
    config: &AgingConfig,
    fvg_config: &FvgConfig,
) -> ZoneAging {
    let age_candles = current_index.saturating_sub(ob.displacement_index);
    let age_status = config.age_status(age_candles);
    let fvg_fresh = ob
        .fvg
        .is_some_and(|g| is_fvg_fresh(&g, series, current_index, fvg_config));
    let ratio = volume_ratio(series, ob.displacement_index, config.volume_lookback);

    ZoneAging {
        age_candles,
        age_status,
        fvg_fresh,
        volume_ratio: ratio,
        volumatic_score: config.volumatic_score(age_status, fvg_fresh, ratio),
    }
}
