//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Providers carry missing OHLC fields as NaN. Such bars are "malformed":
/// they are kept in the sequence so indices stay aligned, and every
/// indicator value that depends on them is undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLC field is missing (NaN) or infinite.
    pub fn is_malformed(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_malformed() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// (high + low) / 2, or `None` if either side is missing.
    pub fn midprice(&self) -> Option<f64> {
        if self.high.is_finite() && self.low.is_finite() {
            Some((self.high + self.low) / 2.0)
        } else {
            None
        }
    }

    /// Close price, or `None` if missing.
    pub fn close_value(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }
}

/// Check that timestamps are strictly increasing.
///
/// This is the only structural check on a bar sequence. Malformed OHLC values
/// are not rejected here; they propagate as undefined indicator values.
pub fn validate_bars(bars: &[Bar]) -> Result<(), SignalError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(SignalError::NonAscendingTimestamps { index: i + 1 });
        }
    }
    Ok(())
}
