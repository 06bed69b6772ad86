//! EMA-cross screener: forecasts when a fast EMA will cross above a slow one
//! and ranks symbols by how soon and how cleanly that happens.

pub mod ema_cross;

pub use ema_cross::{
    classify_cross, cross_forecast, cross_score, forecast_cross_days, rank_rows, screen_symbol,
    CrossForecast, CrossReason, ScreenerConfig, ScreenerRow, SLOPE_BARS,
};
