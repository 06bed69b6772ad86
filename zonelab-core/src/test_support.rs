//! Owned column fixtures for unit tests.

use crate::domain::Ohlcv;

/// Owned OHLCV columns; `view()` hands out the validated borrow.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Columns {
    /// Bars from (open, close) bodies with a fixed wick of `wick` on each side.
    pub fn from_bodies(bodies: &[(f64, f64)], wick: f64) -> Self {
        let mut cols = Self::default();
        for &(open, close) in bodies {
            cols.push(open, open.max(close) + wick, open.min(close) - wick, close, 1000.0);
        }
        cols
    }

    pub fn push(&mut self, open: f64, high: f64, low: f64, close: f64, volume: f64) {
        self.open.push(open);
        self.high.push(high);
        self.low.push(low);
        self.close.push(close);
        self.volume.push(volume);
    }

    pub fn view(&self) -> Ohlcv<'_> {
        Ohlcv::new(
            &self.open,
            &self.high,
            &self.low,
            &self.close,
            Some(&self.volume),
        )
        .unwrap()
    }
}

/// 20 alternating flat candles (body 1.0), a bearish candle (body 1.0) and a
/// bullish candle engulfing it (body 2.5). Wicks are 0.2.
///
/// The bearish candle sits at index 20 with body [100.0, 101.0].
pub fn engulfing_fixture() -> Columns {
    let mut bodies = Vec::new();
    for i in 0..20 {
        if i % 2 == 0 {
            bodies.push((100.0, 101.0));
        } else {
            bodies.push((101.0, 100.0));
        }
    }
    bodies.push((101.0, 100.0));
    bodies.push((99.8, 102.3));
    Columns::from_bodies(&bodies, 0.2)
}
