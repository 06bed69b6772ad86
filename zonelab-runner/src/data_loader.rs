//! OHLCV loading for the runner.
//!
//! Sources:
//! 1. A CSV file with header `date,open,high,low,close[,volume]`
//! 2. A directory of `<SYMBOL>.csv` files (unreadable files are skipped with a warning)
//! 3. A deterministic synthetic random walk, seeded from the symbol name
//!
//! Rows are sorted by date and validated through `Ohlcv::new`, so anything
//! returned here can be handed to the detectors without further checks.
//! Synthetic data is a developer-only mode and is tagged as such.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use zonelab_core::domain::Ohlcv;
use zonelab_core::SeriesError;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{symbol}': {source}")]
    Csv {
        symbol: String,
        #[source]
        source: csv::Error,
    },

    #[error("'{symbol}' row {row}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate {
        symbol: String,
        row: usize,
        value: String,
    },

    #[error("'{symbol}': duplicate date {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("'{symbol}': no rows")]
    Empty { symbol: String },

    #[error("'{symbol}': {source}")]
    Series {
        symbol: String,
        #[source]
        source: SeriesError,
    },
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Owned, validated OHLCV columns for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub source: DataSource,
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Option<Vec<f64>>,
}

impl SymbolSeries {
    /// Validate columns and build the series.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        source: DataSource,
        dates: Vec<NaiveDate>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Option<Vec<f64>>,
    ) -> Result<Self, LoadError> {
        let series = Self {
            symbol: symbol.into(),
            source,
            dates,
            open,
            high,
            low,
            close,
            volume,
        };
        if series.dates.len() != series.close.len() {
            return Err(LoadError::Series {
                symbol: series.symbol,
                source: SeriesError::LengthMismatch {
                    field: "dates",
                    expected: series.close.len(),
                    actual: series.dates.len(),
                },
            });
        }
        if let Some(source) = series.try_view().err() {
            return Err(LoadError::Series {
                symbol: series.symbol,
                source,
            });
        }
        Ok(series)
    }

    fn try_view(&self) -> Result<Ohlcv<'_>, SeriesError> {
        Ohlcv::new(
            &self.open,
            &self.high,
            &self.low,
            &self.close,
            self.volume.as_deref(),
        )
    }

    /// Borrowed view for the detectors.
    pub fn view(&self) -> Result<Ohlcv<'_>, LoadError> {
        self.try_view().map_err(|source| LoadError::Series {
            symbol: self.symbol.clone(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }

    /// Index of the last bar dated on or before `date`.
    pub fn index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        self.dates.partition_point(|d| *d <= date).checked_sub(1)
    }

    /// Deterministic BLAKE3 hash over symbol, dates and OHLCV values.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for i in 0..self.len() {
            hasher.update(self.dates[i].to_string().as_bytes());
            hasher.update(&self.open[i].to_le_bytes());
            hasher.update(&self.high[i].to_le_bytes());
            hasher.update(&self.low[i].to_le_bytes());
            hasher.update(&self.close[i].to_le_bytes());
            if let Some(volume) = &self.volume {
                hasher.update(&volume[i].to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse CSV bars from any reader.
///
/// Volume is kept only when every row carries it.
pub fn read_csv<R: Read>(symbol: &str, reader: R) -> Result<SymbolSeries, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        symbol: symbol.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows: Vec<(NaiveDate, CsvRow)> = Vec::new();
    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(csv_err)?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| {
            LoadError::InvalidDate {
                symbol: symbol.to_string(),
                row: i + 1,
                value: row.date.clone(),
            }
        })?;
        rows.push((date, row));
    }

    if rows.is_empty() {
        return Err(LoadError::Empty {
            symbol: symbol.to_string(),
        });
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(LoadError::DuplicateDate {
            symbol: symbol.to_string(),
            date: w[0].0,
        });
    }

    let has_volume = rows.iter().all(|(_, r)| r.volume.is_some());
    let n = rows.len();
    let mut dates = Vec::with_capacity(n);
    let mut open = Vec::with_capacity(n);
    let mut high = Vec::with_capacity(n);
    let mut low = Vec::with_capacity(n);
    let mut close = Vec::with_capacity(n);
    let mut volume = Vec::with_capacity(if has_volume { n } else { 0 });
    for (date, row) in rows {
        dates.push(date);
        open.push(row.open);
        high.push(row.high);
        low.push(row.low);
        close.push(row.close);
        if has_volume {
            volume.push(row.volume.unwrap_or_default());
        }
    }

    SymbolSeries::new(
        symbol,
        DataSource::Csv,
        dates,
        open,
        high,
        low,
        close,
        has_volume.then_some(volume),
    )
}

/// Symbol name for a CSV path: the file stem.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load one CSV file. The symbol is the file stem.
pub fn load_csv(path: &Path) -> Result<SymbolSeries, LoadError> {
    let symbol = symbol_from_path(path);
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let series = read_csv(&symbol, file)?;
    info!(symbol = %series.symbol, bars = series.len(), path = %path.display(), "loaded CSV");
    Ok(series)
}

/// Load every `*.csv` in `dir`, sorted by file name.
///
/// Files that fail to parse or validate are skipped with a warning; only an
/// unreadable directory is an error.
pub fn load_dir(dir: &Path) -> Result<Vec<SymbolSeries>, LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_csv(path) {
            Ok(series) => loaded.push(series),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping file"),
        }
    }
    info!(
        dir = %dir.display(),
        loaded = loaded.len(),
        skipped = paths.len() - loaded.len(),
        "loaded directory"
    );
    Ok(loaded)
}

/// Generate `bars` weekday bars of a synthetic random walk starting at `start`.
///
/// Seeded from the BLAKE3 hash of the symbol, so the same symbol always
/// yields the same series. Starts at 100.0 with daily moves of up to 3%.
pub fn generate_synthetic(symbol: &str, start: NaiveDate, bars: usize) -> SymbolSeries {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    warn!(symbol, bars, "generating synthetic data; results are tagged as synthetic");

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::with_capacity(bars);
    let mut open = Vec::with_capacity(bars);
    let mut high = Vec::with_capacity(bars);
    let mut low = Vec::with_capacity(bars);
    let mut close = Vec::with_capacity(bars);
    let mut volume = Vec::with_capacity(bars);

    let mut price = 100.0_f64;
    let mut current = start;
    while dates.len() < bars {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let o = price;
        let c = price * (1.0 + daily_return);
        dates.push(current);
        open.push(o);
        close.push(c);
        high.push(o.max(c) * (1.0 + rng.gen_range(0.0..0.01)));
        low.push(o.min(c) * (1.0 - rng.gen_range(0.0..0.01)));
        volume.push(rng.gen_range(500_000..5_000_000u64) as f64);

        price = c;
        current += chrono::Duration::days(1);
    }
    debug!(symbol, last_close = price, "synthetic series ready");

    SymbolSeries {
        symbol: symbol.to_string(),
        source: DataSource::Synthetic,
        dates,
        open,
        high,
        low,
        close,
        volume: Some(volume),
    }
}
