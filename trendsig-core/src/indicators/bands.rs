//! Raw Supertrend bands: midprice ± multiplier · ATR.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Unratcheted upper/lower volatility bands for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPair {
    pub upper: f64,
    pub lower: f64,
}

impl BandPair {
    pub fn new(midprice: f64, atr: f64, multiplier: f64) -> Self {
        let offset = multiplier * atr;
        Self {
            upper: midprice + offset,
            lower: midprice - offset,
        }
    }
}

/// Elementwise band computation. Undefined wherever ATR or the midprice is.
///
/// `atr` must have the same length as `bars`.
pub fn compute_bands(bars: &[Bar], atr: &[Option<f64>], multiplier: f64) -> Vec<Option<BandPair>> {
    debug_assert_eq!(bars.len(), atr.len());
    bars.iter()
        .zip(atr)
        .map(|(bar, atr)| {
            let mid = bar.midprice()?;
            let atr = (*atr)?;
            Some(BandPair::new(mid, atr, multiplier))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn bands_straddle_midprice() {
        let bars = make_ohlc_bars(&[(100.0, 104.0, 96.0, 101.0)]);
        let bands = compute_bands(&bars, &[Some(2.0)], 3.0);
        let pair = bands[0].unwrap();
        assert_approx(pair.upper, 106.0, DEFAULT_EPSILON);
        assert_approx(pair.lower, 94.0, DEFAULT_EPSILON);
    }

    #[test]
    fn undefined_atr_gives_undefined_bands() {
        let bars = make_ohlc_bars(&[(100.0, 104.0, 96.0, 101.0), (101.0, 105.0, 97.0, 102.0)]);
        let bands = compute_bands(&bars, &[None, Some(1.0)], 3.0);
        assert!(bands[0].is_none());
        assert!(bands[1].is_some());
    }

    #[test]
    fn missing_high_gives_undefined_bands() {
        let bars = make_ohlc_bars(&[(100.0, f64::NAN, 96.0, 101.0)]);
        let bands = compute_bands(&bars, &[Some(1.0)], 3.0);
        assert!(bands[0].is_none());
    }

    #[test]
    fn zero_atr_collapses_to_midprice() {
        let bars = make_ohlc_bars(&[(100.0, 100.0, 100.0, 100.0)]);
        let pair = compute_bands(&bars, &[Some(0.0)], 3.0)[0].unwrap();
        assert_eq!(pair.upper, 100.0);
        assert_eq!(pair.lower, 100.0);
    }
}
