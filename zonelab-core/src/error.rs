//! Contract-violation errors raised when an input series is malformed.
//!
//! Short series and "nothing detected" are not errors; detectors report those
//! as empty vectors, `None`, or a classification code.

use thiserror::Error;

/// A series handed to the core broke its input contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series length mismatch: `{field}` has {actual} values, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid `{field}` value at index {index}: {value} (must be finite and non-negative)")]
    InvalidValue {
        field: &'static str,
        index: usize,
        value: f64,
    },

    #[error(
        "inconsistent candle at index {index}: high={high}, low={low}, open={open}, close={close}"
    )]
    InconsistentBar {
        index: usize,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("bar index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
