//! Simple Moving Average (SMA).
//!
//! Rolling arithmetic mean over a fixed window. A window containing any
//! undefined value is itself undefined.

use super::Indicator;
use crate::domain::Bar;

/// Rolling mean of `values` over `period` entries.
///
/// result[i] is the mean of values[i+1-period..=i] when all of them are
/// defined, `None` otherwise (including every i < period - 1).
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut missing = 0usize;

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => sum += v,
            None => missing += 1,
        }

        if i >= period {
            match values[i - period] {
                Some(v) => sum -= v,
                None => missing -= 1,
            }
        }

        if i + 1 >= period && missing == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    result
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<Option<f64>> = bars.iter().map(Bar::close_value).collect();
        rolling_mean(&closes, self.period)
    }
}
