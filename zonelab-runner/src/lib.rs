//! ZoneLab Runner — configuration, data loading, reports, screening, export.
//!
//! This crate builds on `zonelab-core` to provide:
//! - TOML configuration with validation
//! - CSV loading (single file or a directory) and deterministic synthetic series
//! - Per-symbol analysis reports, zone histories and structure reports
//! - A parallel multi-symbol EMA-cross screener
//! - JSON / CSV export
//!
//! Unlike the core, everything here emits `tracing` events.

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod screen;

pub use config::{ConfigError, ZonelabConfig};
pub use data_loader::{
    generate_synthetic, load_csv, load_dir, read_csv, DataSource, LoadError, SymbolSeries,
};
pub use export::{rows_to_csv, rows_to_json, to_json, write_output, ExportError};
pub use runner::{
    analyze_symbol, structure_report, zone_history, AnalysisReport, BarSelector, RunError,
    StructureReport, ZoneHistory, SCHEMA_VERSION,
};
pub use screen::{ScreenResults, Screener};
