//! ZoneLab Core — market-structure and liquidity-zone detection over OHLCV slices.
//!
//! This crate is pure computation: no I/O, no logging, no shared state.
//! - Domain values (candles, validated series views, swings, BOS, FVGs, order blocks)
//! - Swing pivots and break-of-structure detection
//! - Order block and fair value gap detectors with freshness filtering
//! - Zone aging / volumatic score and OB + FVG confluence score
//! - EMA-cross screener
//! - Single-bar analysis (`analyze`, `analyze_at`) with no look-ahead

pub mod analysis;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod scoring;
pub mod screener;
pub mod structure;
pub mod zones;

#[cfg(test)]
mod test_support;

pub use analysis::{analyze, analyze_at, AnalysisConfig, ZoneAnalysis};
pub use error::SeriesError;
