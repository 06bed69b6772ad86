//! Single-bar analysis: everything the detectors say about a series as of
//! one bar.
//!
//! `analyze_at(series, k)` only reads bars `0..=k`, so replaying history bar
//! by bar never sees the future.

use serde::{Deserialize, Serialize};

use crate::domain::{Bos, BosDirection, Fvg, Ohlcv, OrderBlock, Swing};
use crate::error::SeriesError;
use crate::indicators::latest_atr;
use crate::scoring::{
    score_confluence, score_zone, AgingConfig, ConfluenceConfig, ConfluenceResult, ZoneAging,
};
use crate::structure::{find_bos, find_swings_in, structure_bias, SwingConfig};
use crate::zones::{detect_orderblock, is_fvg_fresh, latest_fvg, FvgConfig, OrderBlockConfig};

/// Detector and scorer settings used by one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub swing: SwingConfig,
    pub orderblock: OrderBlockConfig,
    pub fvg: FvgConfig,
    pub aging: AgingConfig,
    pub confluence: ConfluenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAnalysis {
    /// Bar the analysis is evaluated at.
    pub bar_index: usize,
    pub last_close: f64,
    /// Best fresh order block, if any.
    pub orderblock: Option<OrderBlock>,
    pub aging: Option<ZoneAging>,
    /// Most recent gap, mitigated or not.
    pub latest_fvg: Option<Fvg>,
    pub fvg_fresh: bool,
    pub atr: Option<f64>,
    pub confluence: ConfluenceResult,
    pub swings: Vec<Swing>,
    pub bos: Vec<Bos>,
    pub bias: Option<BosDirection>,
}

impl ZoneAnalysis {
    pub fn has_zone(&self) -> bool {
        self.orderblock.is_some()
    }
}

/// Analyze the whole series as of its last bar. `None` for an empty series.
pub fn analyze(series: &Ohlcv<'_>, config: &AnalysisConfig) -> Option<ZoneAnalysis> {
    let last = series.len().checked_sub(1)?;
    Some(evaluate(series, last, config))
}

/// Analyze as of bar `at`, ignoring every later bar.
pub fn analyze_at(
    series: &Ohlcv<'_>,
    at: usize,
    config: &AnalysisConfig,
) -> Result<ZoneAnalysis, SeriesError> {
    let view = series.up_to(at)?;
    Ok(evaluate(&view, at, config))
}

fn evaluate(series: &Ohlcv<'_>, at: usize, config: &AnalysisConfig) -> ZoneAnalysis {
    let last_close = series.close()[at];

    let swings = find_swings_in(series, &config.swing);
    let bos = find_bos(series, Some(&swings), &config.swing);
    let bias = structure_bias(&bos);

    let orderblock = detect_orderblock(series, &config.orderblock);
    let aging = orderblock
        .as_ref()
        .map(|ob| score_zone(ob, series, at, &config.aging, &config.fvg));

    let latest = latest_fvg(series);
    let fvg_fresh = latest.is_some_and(|g| is_fvg_fresh(&g, series, at, &config.fvg));

    let atr = if config.confluence.atr_period >= 1 {
        latest_atr(series, config.confluence.atr_period)
    } else {
        None
    };
    let confluence = score_confluence(
        orderblock.as_ref(),
        latest.as_ref(),
        fvg_fresh,
        last_close,
        atr,
        &config.confluence,
    );

    ZoneAnalysis {
        bar_index: at,
        last_close,
        orderblock,
        aging,
        latest_fvg: latest,
        fvg_fresh,
        atr,
        confluence,
        swings,
        bos,
        bias,
    }
}
