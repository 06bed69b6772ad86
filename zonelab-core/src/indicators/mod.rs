//! Slice-based indicator math shared by the detectors and the screener.
//!
//! Every function takes plain `&[f64]` columns and returns a series of the
//! same length, with `f64::NAN` marking warmup bars.

pub mod atr;
pub mod ema;
pub mod stats;

pub use atr::{atr, latest_atr, true_range, wilder_smooth};
pub use ema::ema_of_series;
pub use stats::{mean, median};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
