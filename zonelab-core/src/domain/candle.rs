//! Candle: one OHLCV bar, copied out of a series for per-bar logic.

use serde::{Deserialize, Serialize};

/// A single OHLCV bar.
///
/// Body helpers work on open/close only. Zones are always drawn from bodies,
/// never from wicks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Upper edge of the body: max(open, close).
    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Lower edge of the body: min(open, close).
    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Absolute body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, close: f64) -> Candle {
        Candle {
            open,
            high: open.max(close) + 0.5,
            low: open.min(close) - 0.5,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn body_edges_ignore_wicks() {
        let c = candle(12.0, 10.0);
        assert_eq!(c.body_high(), 12.0);
        assert_eq!(c.body_low(), 10.0);
        assert_eq!(c.body(), 2.0);
        assert!(c.is_bearish());
        assert!(!c.is_bullish());
    }

    #[test]
    fn doji_is_neither_color() {
        let c = candle(10.0, 10.0);
        assert!(!c.is_bullish());
        assert!(!c.is_bearish());
        assert_eq!(c.body(), 0.0);
    }
}
