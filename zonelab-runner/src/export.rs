//! JSON and CSV artifacts.
//!
//! Reports and zone histories are written as pretty JSON; screener rows as
//! JSON or CSV. Missing values (`days_to_cross` with no forecast, EMA fields
//! of an insufficient-data row) are `null` in JSON and empty in CSV, never 0.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use zonelab_core::screener::ScreenerRow;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(String),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Pretty JSON for any report type.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn rows_to_json(rows: &[ScreenerRow]) -> Result<String, ExportError> {
    to_json(rows)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn float_cell(value: f64, precision: usize) -> String {
    if value.is_finite() {
        format!("{value:.precision$}")
    } else {
        String::new()
    }
}

/// Screener rows as CSV, one line per row in rank order.
///
/// Columns: rank, symbol, last_close, ema_fast, ema_slow, gap, slope_diff,
/// days_to_cross, score, reason
pub fn rows_to_csv(rows: &[ScreenerRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "symbol",
        "last_close",
        "ema_fast",
        "ema_slow",
        "gap",
        "slope_diff",
        "days_to_cross",
        "score",
        "reason",
    ])?;

    for (i, row) in rows.iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            &row.symbol,
            &float_cell(row.last_close, 4),
            &float_cell(row.ema_fast, 4),
            &float_cell(row.ema_slow, 4),
            &float_cell(row.gap, 6),
            &float_cell(row.slope_diff, 6),
            &row.days_to_cross.map(|d| d.to_string()).unwrap_or_default(),
            &format!("{:.2}", row.score),
            row.reason.as_str(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(data)?)
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write `content` to `path`, creating parent directories.
pub fn write_output(path: &Path, content: &str) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)
}
