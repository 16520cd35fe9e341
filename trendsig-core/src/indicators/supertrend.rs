//! Supertrend: ATR-based trailing bands with directional hysteresis.
//!
//! Inherently sequential: the state at bar i depends on the state at bar
//! i-1. The engine folds an immutable [`SupertrendState`] forward over the
//! bars; the final bands themselves are part of that state.
//!
//! Ratchet: the final lower band never steps down and the final upper band
//! never steps up, unless the previous close broke through it.
//!
//! Lookback: atr_period (first state at index `atr_period` on clean data).

use serde::{Deserialize, Serialize};

use super::atr::Atr;
use super::bands::{compute_bands, BandPair};
use super::Indicator;
use crate::domain::{Bar, Direction};
use crate::error::{check_multiplier, check_period, SignalError};

/// Supertrend state for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupertrendState {
    pub final_upper: f64,
    pub final_lower: f64,
    pub trend_value: f64,
    pub direction: Direction,
}

impl SupertrendState {
    /// First state: take the raw bands and start Bearish on the upper band.
    pub fn initial(bands: BandPair) -> Self {
        Self {
            final_upper: bands.upper,
            final_lower: bands.lower,
            trend_value: bands.upper,
            direction: Direction::Bearish,
        }
    }

    /// Next state from the raw bands and close of the current bar.
    ///
    /// `prev_close` is the close of the bar that produced `self`.
    pub fn advance(&self, prev_close: f64, bands: BandPair, close: f64) -> Self {
        let final_lower = if bands.lower > self.final_lower || prev_close < self.final_lower {
            bands.lower
        } else {
            self.final_lower
        };

        let final_upper = if bands.upper < self.final_upper || prev_close > self.final_upper {
            bands.upper
        } else {
            self.final_upper
        };

        let direction = match self.direction {
            Direction::Bearish if close > final_upper => Direction::Bullish,
            Direction::Bearish => Direction::Bearish,
            Direction::Bullish if close < final_lower => Direction::Bearish,
            Direction::Bullish => Direction::Bullish,
        };

        let trend_value = match direction {
            Direction::Bullish => final_lower,
            Direction::Bearish => final_upper,
        };

        Self {
            final_upper,
            final_lower,
            trend_value,
            direction,
        }
    }
}

/// Per-bar output of one engine run. `None` where the bar had no state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupertrendSeries {
    pub atr_period: usize,
    pub multiplier: f64,
    pub states: Vec<Option<SupertrendState>>,
}

impl SupertrendSeries {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn direction(&self, index: usize) -> Option<Direction> {
        self.states.get(index).copied().flatten().map(|s| s.direction)
    }

    pub fn directions(&self) -> Vec<Option<Direction>> {
        self.states.iter().map(|s| s.map(|s| s.direction)).collect()
    }

    pub fn trend_values(&self) -> Vec<Option<f64>> {
        self.states.iter().map(|s| s.map(|s| s.trend_value)).collect()
    }

    /// Index of the first defined state.
    pub fn first_defined(&self) -> Option<usize> {
        self.states.iter().position(Option::is_some)
    }

    /// Number of direction changes between consecutive defined states.
    pub fn flip_count(&self) -> usize {
        self.states
            .iter()
            .flatten()
            .zip(self.states.iter().flatten().skip(1))
            .filter(|(a, b)| a.direction != b.direction)
            .count()
    }
}

/// One Supertrend instance: ATR period plus band multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendEngine {
    atr_period: usize,
    multiplier: f64,
}

impl SupertrendEngine {
    pub fn new(atr_period: usize, multiplier: f64) -> Result<Self, SignalError> {
        check_period(atr_period)?;
        check_multiplier("multiplier", multiplier)?;
        Ok(Self {
            atr_period,
            multiplier,
        })
    }

    pub fn atr_period(&self) -> usize {
        self.atr_period
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Compute ATR and bands, then run the recurrence.
    pub fn run(&self, bars: &[Bar]) -> SupertrendSeries {
        let atr = Atr::new(self.atr_period).compute(bars);
        self.run_with_atr(bars, &atr)
    }

    /// Run the recurrence over a precomputed ATR series.
    ///
    /// Lets several engines with different multipliers share one ATR.
    pub fn run_with_atr(&self, bars: &[Bar], atr: &[Option<f64>]) -> SupertrendSeries {
        let bands = compute_bands(bars, atr, self.multiplier);

        let states = bars
            .iter()
            .zip(&bands)
            .scan(None, |carried: &mut Option<(SupertrendState, f64)>, (bar, bands)| {
                let step = match (bands, bar.close_value()) {
                    (Some(bands), Some(close)) => {
                        let next = match *carried {
                            None => SupertrendState::initial(*bands),
                            Some((prev, prev_close)) => prev.advance(prev_close, *bands, close),
                        };
                        *carried = Some((next, close));
                        Some(next)
                    }
                    // Undefined bar: emit nothing and keep the last defined state.
                    _ => None,
                };
                Some(step)
            })
            .collect();

        SupertrendSeries {
            atr_period: self.atr_period,
            multiplier: self.multiplier,
            states,
        }
    }
}

/// Supertrend trend line as a single-series [`Indicator`].
#[derive(Debug, Clone)]
pub struct Supertrend {
    engine: SupertrendEngine,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        assert!(
            multiplier.is_finite() && multiplier > 0.0,
            "Supertrend multiplier must be > 0"
        );
        Self {
            engine: SupertrendEngine {
                atr_period: period,
                multiplier,
            },
            name: format!("supertrend_{period}_{multiplier}"),
        }
    }

    pub fn engine(&self) -> &SupertrendEngine {
        &self.engine
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.engine.atr_period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        self.engine.run(bars).trend_values()
    }
}
