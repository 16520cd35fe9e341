//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the arithmetic mean of the last `period` true-range values.
//! TR[0] is undefined (no previous close), so ATR is first defined at
//! index `period` and needs at least `period + 1` bars.

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Compute the True Range series from bars.
///
/// TR[0] is `None`. TR[t] is `None` when bar t or the close of bar t-1 is
/// missing.
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut tr = Vec::with_capacity(bars.len());
    if bars.is_empty() {
        return tr;
    }
    tr.push(None);

    for pair in bars.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let value = match (prev.close_value(), cur.is_malformed()) {
            (Some(pc), false) => {
                let (h, l) = (cur.high, cur.low);
                Some((h - l).max((h - pc).abs()).max((l - pc).abs()))
            }
            _ => None,
        };
        tr.push(value);
    }

    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let atr = rolling_mean(&true_range(bars), self.period);
        tracing::debug!(
            period = self.period,
            bars = bars.len(),
            defined = atr.iter().filter(|v| v.is_some()).count(),
            "ATR computed"
        );
        atr
    }
}
