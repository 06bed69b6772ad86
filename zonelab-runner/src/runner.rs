//! Per-symbol runs: full analysis report, zone history and structure.
//!
//! Each run evaluates the series as of one bar (the last bar by default),
//! reading nothing after it.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span};
use zonelab_core::domain::{Bos, BosDirection, Fvg, OrderBlock, Swing};
use zonelab_core::scoring::{score_zone, ZoneAging};
use zonelab_core::screener::{screen_symbol, ScreenerRow};
use zonelab_core::structure::{find_bos, find_swings_in, structure_bias};
use zonelab_core::zones::{find_all_orderblocks, find_fvgs, is_fvg_fresh, is_orderblock_fresh};
use zonelab_core::{analyze_at, SeriesError, ZoneAnalysis};

use crate::config::{ConfigError, ZonelabConfig};
use crate::data_loader::{DataSource, LoadError, SymbolSeries};
use crate::export::ExportError;

/// Report schema version written into every artifact.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Load(#[from] LoadError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("'{symbol}': {source}")]
    Series {
        symbol: String,
        #[source]
        source: SeriesError,
    },

    #[error("'{symbol}': series is empty")]
    EmptySeries { symbol: String },

    #[error("'{symbol}': no bar on or before {date}")]
    NoBarForDate { symbol: String, date: NaiveDate },
}

/// Which bar a run is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarSelector {
    #[default]
    Last,
    Index(usize),
    /// Last bar dated on or before this date.
    Date(NaiveDate),
}

impl BarSelector {
    pub fn resolve(&self, series: &SymbolSeries) -> Result<usize, RunError> {
        let last = series.len().checked_sub(1).ok_or_else(|| RunError::EmptySeries {
            symbol: series.symbol.clone(),
        })?;
        match *self {
            BarSelector::Last => Ok(last),
            BarSelector::Index(i) if i <= last => Ok(i),
            BarSelector::Index(i) => Err(RunError::Series {
                symbol: series.symbol.clone(),
                source: SeriesError::IndexOutOfRange {
                    index: i,
                    len: series.len(),
                },
            }),
            BarSelector::Date(date) => {
                series
                    .index_on_or_before(date)
                    .ok_or_else(|| RunError::NoBarForDate {
                        symbol: series.symbol.clone(),
                        date,
                    })
            }
        }
    }
}

/// Everything known about one symbol as of one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub symbol: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub bar_date: NaiveDate,
    pub bar_count: usize,
    pub analysis: ZoneAnalysis,
    pub screener: ScreenerRow,
}

impl AnalysisReport {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Run the full analysis for `series` at the selected bar.
pub fn analyze_symbol(
    series: &SymbolSeries,
    config: &ZonelabConfig,
    bar: BarSelector,
) -> Result<AnalysisReport, RunError> {
    let at = bar.resolve(series)?;
    let span = info_span!("analyze", symbol = %series.symbol, bar = at);
    let _guard = span.enter();

    let view = series.view()?;
    let series_err = |source| RunError::Series {
        symbol: series.symbol.clone(),
        source,
    };
    let analysis = analyze_at(&view, at, &config.analysis()).map_err(series_err)?;
    let screener = screen_symbol(&series.symbol, &series.close[..=at], &config.screener)
        .map_err(series_err)?;

    info!(
        zone = analysis.has_zone(),
        confluence = analysis.confluence.score,
        reason = %screener.reason,
        "analysis complete"
    );

    Ok(AnalysisReport {
        schema_version: SCHEMA_VERSION,
        symbol: series.symbol.clone(),
        source: series.source,
        dataset_hash: series.dataset_hash(),
        bar_date: series.dates[at],
        bar_count: at + 1,
        analysis,
        screener,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBlockEntry {
    pub orderblock: OrderBlock,
    pub formed: NaiveDate,
    pub fresh: bool,
    pub aging: ZoneAging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FvgEntry {
    pub fvg: Fvg,
    pub formed: NaiveDate,
    pub fresh: bool,
}

/// Every order block and gap up to one bar, with freshness at that bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneHistory {
    pub symbol: String,
    pub bar_index: usize,
    pub bar_date: NaiveDate,
    pub orderblocks: Vec<OrderBlockEntry>,
    pub fvgs: Vec<FvgEntry>,
}

impl ZoneHistory {
    pub fn fresh_orderblocks(&self) -> impl Iterator<Item = &OrderBlockEntry> {
        self.orderblocks.iter().filter(|e| e.fresh)
    }
}

pub fn zone_history(
    series: &SymbolSeries,
    config: &ZonelabConfig,
    bar: BarSelector,
) -> Result<ZoneHistory, RunError> {
    let at = bar.resolve(series)?;
    let full = series.view()?;
    let view = full.prefix(at + 1);

    let orderblocks: Vec<OrderBlockEntry> = find_all_orderblocks(&view, &config.orderblock, false)
        .into_iter()
        .map(|ob| OrderBlockEntry {
            formed: series.dates[ob.index],
            fresh: is_orderblock_fresh(&ob, &view, at),
            aging: score_zone(&ob, &view, at, &config.aging, &config.fvg),
            orderblock: ob,
        })
        .collect();
    let fvgs: Vec<FvgEntry> = find_fvgs(&view, &config.fvg, false)
        .into_iter()
        .map(|fvg| FvgEntry {
            formed: series.dates[fvg.index],
            fresh: is_fvg_fresh(&fvg, &view, at, &config.fvg),
            fvg,
        })
        .collect();

    debug!(
        symbol = %series.symbol,
        orderblocks = orderblocks.len(),
        fvgs = fvgs.len(),
        "zone history"
    );

    Ok(ZoneHistory {
        symbol: series.symbol.clone(),
        bar_index: at,
        bar_date: series.dates[at],
        orderblocks,
        fvgs,
    })
}

/// Swings and breaks of structure up to one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureReport {
    pub symbol: String,
    pub bar_index: usize,
    pub bar_date: NaiveDate,
    pub swings: Vec<Swing>,
    pub bos: Vec<Bos>,
    pub bias: Option<BosDirection>,
}

pub fn structure_report(
    series: &SymbolSeries,
    config: &ZonelabConfig,
    bar: BarSelector,
) -> Result<StructureReport, RunError> {
    let at = bar.resolve(series)?;
    let full = series.view()?;
    let view = full.prefix(at + 1);

    let swings = find_swings_in(&view, &config.swing);
    let bos = find_bos(&view, Some(&swings), &config.swing);
    let bias = structure_bias(&bos);

    Ok(StructureReport {
        symbol: series.symbol.clone(),
        bar_index: at,
        bar_date: series.dates[at],
        swings,
        bos,
        bias,
    })
}
