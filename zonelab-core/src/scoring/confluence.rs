//! Confluence of an order block and the most recent fair value gap.
//!
//! score = clamp(ob_score + fvg_score + overlap_bonus + proximity_bonus, 0, 100)
//!
//! Point sums saturate, so oversized weights clamp instead of overflowing.
//!
//! - `ob_score`: base points for a block, plus a bonus when it carries a gap
//! - `fvg_score`: base points for a gap, plus a bonus while it is unmitigated
//! - `overlap_bonus`: block zone and gap intersect (closed intervals)
//! - `proximity_bonus`: `proximity_max * (1 - distance / (atr * span))`,
//!   floored at 0, where distance is from price to the block (or the gap when
//!   there is no block). Without a usable ATR only price inside the zone
//!   earns the bonus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::zone::interval_distance;
use crate::domain::{Fvg, OrderBlock};
use crate::zones::freshness::zones_intersect;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    pub ob_base: u32,
    pub ob_fvg_bonus: u32,
    pub fvg_base: u32,
    pub fvg_fresh_bonus: u32,
    pub overlap_bonus: u32,
    pub proximity_max: u32,
    /// Distance, in ATRs, at which the proximity bonus reaches zero.
    pub proximity_atr_span: f64,
    /// A single structure counts as confluence only when the score is
    /// strictly above this.
    pub cutoff: u8,
    pub atr_period: usize,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            ob_base: 30,
            ob_fvg_bonus: 10,
            fvg_base: 20,
            fvg_fresh_bonus: 10,
            overlap_bonus: 20,
            proximity_max: 15,
            proximity_atr_span: 3.0,
            cutoff: 60,
            atr_period: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceResult {
    pub has_confluence: bool,
    pub score: u8,
    pub ob_score: u32,
    pub fvg_score: u32,
    pub overlap_bonus: u32,
    pub proximity_bonus: u32,
    pub reason: String,
    pub details: BTreeMap<String, f64>,
}

/// Share of the proximity bonus earned at `distance`, in 0..=1.
pub fn proximity_factor(distance: f64, atr: Option<f64>, span: f64) -> f64 {
    match atr.filter(|a| a.is_finite() && *a > 0.0) {
        Some(a) if span > 0.0 => (1.0 - distance / (a * span)).clamp(0.0, 1.0),
        _ => {
            if distance <= 0.0 {
                1.0
            } else {
                0.0
            }
        }
    }
}

pub fn score_confluence(
    ob: Option<&OrderBlock>,
    fvg: Option<&Fvg>,
    fvg_fresh: bool,
    current_price: f64,
    atr: Option<f64>,
    config: &ConfluenceConfig,
) -> ConfluenceResult {
    let mut reasons: Vec<&str> = Vec::new();
    let mut details = BTreeMap::new();

    let ob_score = match ob {
        Some(b) if b.has_fvg => {
            reasons.push("order block with FVG");
            config.ob_base.saturating_add(config.ob_fvg_bonus)
        }
        Some(_) => {
            reasons.push("order block");
            config.ob_base
        }
        None => 0,
    };

    let fvg_score = match fvg {
        Some(_) if fvg_fresh => {
            reasons.push("fresh FVG");
            config.fvg_base.saturating_add(config.fvg_fresh_bonus)
        }
        Some(_) => {
            reasons.push("FVG");
            config.fvg_base
        }
        None => 0,
    };

    let overlap_bonus = match (ob, fvg) {
        (Some(b), Some(g)) if zones_intersect(b.zone_top, b.zone_bottom, g.gap_high, g.gap_low) => {
            reasons.push("zones overlap");
            config.overlap_bonus
        }
        _ => 0,
    };

    let anchor = ob
        .map(|b| (b.zone_top, b.zone_bottom))
        .or_else(|| fvg.map(|g| (g.gap_high, g.gap_low)));

    let proximity_bonus = match anchor {
        Some((top, bottom)) => {
            let distance = interval_distance(top, bottom, current_price);
            let factor = proximity_factor(distance, atr, config.proximity_atr_span);
            details.insert("distance".to_string(), distance);
            details.insert("proximity_factor".to_string(), factor);
            if let Some(a) = atr.filter(|a| a.is_finite() && *a > 0.0) {
                details.insert("atr".to_string(), a);
                details.insert("distance_atr".to_string(), distance / a);
            }
            let bonus = (config.proximity_max as f64 * factor).round() as u32;
            if distance <= 0.0 {
                reasons.push("price inside zone");
            } else if bonus > 0 {
                reasons.push("price near zone");
            }
            bonus
        }
        None => 0,
    };

    let total = ob_score
        .saturating_add(fvg_score)
        .saturating_add(overlap_bonus)
        .saturating_add(proximity_bonus);
    let score = total.min(100) as u8;
    let has_confluence = score > config.cutoff || (ob.is_some() && fvg.is_some());

    let reason = if reasons.is_empty() {
        "no structures".to_string()
    } else {
        reasons.join(" + ")
    };

    ConfluenceResult {
        has_confluence,
        score,
        ob_score,
        fvg_score,
        overlap_bonus,
        proximity_bonus,
        reason,
        details,
    }
}
