//! Multi-symbol EMA-cross screener.
//!
//! Each symbol is screened independently, optionally in parallel with Rayon;
//! rows are then ranked and cut to the configured `top`.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};
use zonelab_core::screener::{rank_rows, screen_symbol, CrossReason, ScreenerConfig, ScreenerRow};
use zonelab_core::SeriesError;

use crate::data_loader::SymbolSeries;

/// Screener executor over a set of loaded symbols.
#[derive(Debug, Clone)]
pub struct Screener {
    config: ScreenerConfig,
    parallel: bool,
}

impl Screener {
    pub fn new(config: ScreenerConfig) -> Self {
        Self {
            config,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Override the number of rows kept after ranking.
    pub fn with_top(mut self, top: usize) -> Self {
        self.config.top = top;
        self
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Screen every symbol, rank, and keep the best `top` rows.
    ///
    /// Symbols whose closes fail validation are left out of the ranking and
    /// listed in `rejected`.
    pub fn run(&self, universe: &[SymbolSeries]) -> ScreenResults {
        let span = info_span!("screen", symbols = universe.len(), parallel = self.parallel);
        let _guard = span.enter();

        let outcomes: Vec<Result<ScreenerRow, (String, SeriesError)>> = if self.parallel {
            universe.par_iter().map(|s| self.screen_one(s)).collect()
        } else {
            universe.iter().map(|s| self.screen_one(s)).collect()
        };

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut rejected = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(failure) => rejected.push(failure),
            }
        }

        let mut reasons: BTreeMap<CrossReason, usize> = BTreeMap::new();
        for row in &rows {
            *reasons.entry(row.reason).or_default() += 1;
        }

        let screened = rows.len();
        rank_rows(&mut rows);
        rows.truncate(self.config.top);

        info!(
            screened,
            kept = rows.len(),
            rejected = rejected.len(),
            "screen complete"
        );
        ScreenResults {
            rows,
            screened,
            reasons,
            rejected,
        }
    }

    fn screen_one(&self, series: &SymbolSeries) -> Result<ScreenerRow, (String, SeriesError)> {
        let row = screen_symbol(&series.symbol, &series.close, &self.config).map_err(|e| {
            warn!(symbol = %series.symbol, error = %e, "rejected");
            (series.symbol.clone(), e)
        })?;
        debug!(
            symbol = %row.symbol,
            reason = %row.reason,
            days = ?row.days_to_cross,
            score = row.score,
            "screened"
        );
        Ok(row)
    }
}

/// Ranked screener output.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenResults {
    pub rows: Vec<ScreenerRow>,
    /// Symbols screened before truncation.
    pub screened: usize,
    /// Count of every classification across all screened symbols.
    pub reasons: BTreeMap<CrossReason, usize>,
    /// Symbols with invalid closes, in universe order.
    pub rejected: Vec<(String, SeriesError)>,
}

impl ScreenResults {
    /// Rows with a forecast cross inside the window.
    pub fn candidates(&self) -> impl Iterator<Item = &ScreenerRow> {
        self.rows.iter().filter(|r| r.reason == CrossReason::Ok)
    }

    pub fn count(&self, reason: CrossReason) -> usize {
        self.reasons.get(&reason).copied().unwrap_or(0)
    }
}
