//! Ohlcv: a validated, borrowed view over column-oriented price arrays.
//!
//! Callers own the arrays; the view only lives for the duration of a call.
//! Index 0 is the oldest bar.

use crate::domain::Candle;
use crate::error::SeriesError;

/// Validated OHLCV view.
///
/// Construction checks the input contract once (equal lengths, finite
/// non-negative values, high/low bracketing the body) so that every detector
/// can index freely afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Ohlcv<'a> {
    open: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
    volume: Option<&'a [f64]>,
}

impl<'a> Ohlcv<'a> {
    pub fn new(
        open: &'a [f64],
        high: &'a [f64],
        low: &'a [f64],
        close: &'a [f64],
        volume: Option<&'a [f64]>,
    ) -> Result<Self, SeriesError> {
        let n = open.len();
        check_len("high", n, high)?;
        check_len("low", n, low)?;
        check_len("close", n, close)?;
        if let Some(v) = volume {
            check_len("volume", n, v)?;
            check_values("volume", v)?;
        }
        check_values("open", open)?;
        check_values("high", high)?;
        check_values("low", low)?;
        check_values("close", close)?;

        for i in 0..n {
            let body_high = open[i].max(close[i]);
            let body_low = open[i].min(close[i]);
            if high[i] < body_high || low[i] > body_low {
                return Err(SeriesError::InconsistentBar {
                    index: i,
                    open: open[i],
                    high: high[i],
                    low: low[i],
                    close: close[i],
                });
            }
        }

        Ok(Self {
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn open(&self) -> &'a [f64] {
        self.open
    }

    pub fn high(&self) -> &'a [f64] {
        self.high
    }

    pub fn low(&self) -> &'a [f64] {
        self.low
    }

    pub fn close(&self) -> &'a [f64] {
        self.close
    }

    pub fn volume(&self) -> Option<&'a [f64]> {
        self.volume
    }

    /// Bar `i` as a value. Volume reads as 0.0 when the series has none.
    ///
    /// Panics if `i` is out of range.
    pub fn candle(&self, i: usize) -> Candle {
        Candle {
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume.map_or(0.0, |v| v[i]),
        }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close.last().copied()
    }

    /// The first `len` bars. Already-validated data, so this cannot fail.
    /// `len` larger than the series is clamped.
    pub fn prefix(&self, len: usize) -> Ohlcv<'a> {
        let len = len.min(self.len());
        Ohlcv {
            open: &self.open[..len],
            high: &self.high[..len],
            low: &self.low[..len],
            close: &self.close[..len],
            volume: self.volume.map(|v| &v[..len]),
        }
    }

    /// Prefix ending at (and including) bar `index`.
    pub fn up_to(&self, index: usize) -> Result<Ohlcv<'a>, SeriesError> {
        if index >= self.len() {
            return Err(SeriesError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.prefix(index + 1))
    }
}

pub(crate) fn check_len(
    field: &'static str,
    expected: usize,
    values: &[f64],
) -> Result<(), SeriesError> {
    if values.len() != expected {
        return Err(SeriesError::LengthMismatch {
            field,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_values(field: &'static str, values: &[f64]) -> Result<(), SeriesError> {
    match values
        .iter()
        .position(|v| !v.is_finite() || *v < 0.0)
    {
        Some(index) => Err(SeriesError::InvalidValue {
            field,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}
