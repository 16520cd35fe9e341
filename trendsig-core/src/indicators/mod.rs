//! Indicator implementations: true range, ATR, SMA, bands, Supertrend.
//!
//! Indicators are pure functions: bar history in, series of the same length
//! out. Undefined values (warmup, malformed input) are `None`, never NaN.

pub mod atr;
pub mod bands;
pub mod sma;
pub mod supertrend;

pub use atr::{true_range, Atr};
pub use bands::{compute_bands, BandPair};
pub use sma::{rolling_mean, Sma};
pub use supertrend::{Supertrend, SupertrendEngine, SupertrendSeries, SupertrendState};

use crate::domain::Bar;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on data from bar t+1 or later, so computing
/// over a truncated series must reproduce the prefix of the full series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "atr_10", "supertrend_10_3").
    fn name(&self) -> &str;

    /// Number of leading bars that are always undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a vector of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = close + 1,
/// low = close - 1, one bar per day from 2024-01-02.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, close + 1.0, close - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create bars from (open, high, low, close) tuples, one per day.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

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
