//! Supertrend signal generator.
//!
//! Runs a fast Supertrend (and optionally a slow one with a wider
//! multiplier) over the same bars and ATR period, combines the directions
//! into a composite signal and extracts crossover events.

use serde::{Deserialize, Serialize};

use super::crossover::{detect_crossovers, dual_composite, position_changes, single_composite};
use crate::domain::{validate_bars, Bar, CompositeSignal, CrossoverEvent};
use crate::error::{check_multiplier, check_period, DataNotice, SignalError};
use crate::indicators::{Atr, Indicator, SupertrendEngine, SupertrendSeries};

/// Generator parameters.
///
/// Fields missing from a serialized config take their value from
/// [`SignalConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub atr_period: usize,
    pub fast_multiplier: f64,
    pub slow_multiplier: Option<f64>,
    pub use_dual_confirmation: bool,
}

impl Default for SignalConfig {
    /// ATR 10, fast 3.0, slow 4.0, dual confirmation on.
    fn default() -> Self {
        Self {
            atr_period: 10,
            fast_multiplier: 3.0,
            slow_multiplier: Some(4.0),
            use_dual_confirmation: true,
        }
    }
}

impl SignalConfig {
    /// Single-instance configuration.
    pub fn single(atr_period: usize, fast_multiplier: f64) -> Self {
        Self {
            atr_period,
            fast_multiplier,
            slow_multiplier: None,
            use_dual_confirmation: false,
        }
    }

    /// Dual-confirmation configuration.
    pub fn dual(atr_period: usize, fast_multiplier: f64, slow_multiplier: f64) -> Self {
        Self {
            atr_period,
            fast_multiplier,
            slow_multiplier: Some(slow_multiplier),
            use_dual_confirmation: true,
        }
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        check_period(self.atr_period)?;
        check_multiplier("fast_multiplier", self.fast_multiplier)?;
        match self.slow_multiplier {
            Some(slow) => check_multiplier("slow_multiplier", slow)?,
            None if self.use_dual_confirmation => {
                return Err(SignalError::InvalidParameter {
                    name: "slow_multiplier",
                    reason: "required when use_dual_confirmation is set".into(),
                })
            }
            None => {}
        }
        Ok(())
    }

    /// Bars needed before the first Supertrend value exists.
    pub fn required_bars(&self) -> usize {
        self.atr_period + 1
    }
}

/// Full output of one generator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub config: SignalConfig,
    pub fast: SupertrendSeries,
    pub slow: Option<SupertrendSeries>,
    pub composite: Vec<Option<CompositeSignal>>,
    pub events: Vec<CrossoverEvent>,
    pub notices: Vec<DataNotice>,
}

impl SignalReport {
    pub fn len(&self) -> usize {
        self.composite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composite.is_empty()
    }

    /// Per-bar first difference of the composite signal.
    pub fn position_changes(&self) -> Vec<Option<i8>> {
        position_changes(&self.composite)
    }

    /// Most recent defined composite signal and its index.
    pub fn latest_signal(&self) -> Option<(usize, CompositeSignal)> {
        self.composite
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, s)| s.map(|s| (i, s)))
    }

    /// True when there were too few bars for any output.
    pub fn is_insufficient(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n, DataNotice::InsufficientData { .. }))
    }
}

/// Stateless generator; each call is a pure function of bars and config.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: SignalConfig,
    fast: SupertrendEngine,
    slow: Option<SupertrendEngine>,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Result<Self, SignalError> {
        config.validate()?;
        let fast = SupertrendEngine::new(config.atr_period, config.fast_multiplier)?;
        let slow = config
            .slow_multiplier
            .map(|m| SupertrendEngine::new(config.atr_period, m))
            .transpose()?;
        Ok(Self { config, fast, slow })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Compute both Supertrend series, the composite signal and events.
    ///
    /// Only non-ascending timestamps abort. Short or malformed input yields
    /// undefined values plus [`DataNotice`]s.
    pub fn generate(&self, bars: &[Bar]) -> Result<SignalReport, SignalError> {
        validate_bars(bars)?;
        let notices = collect_notices(bars, self.config.required_bars());
        for notice in &notices {
            tracing::warn!(%notice, "bar data notice");
        }

        let atr = Atr::new(self.config.atr_period).compute(bars);

        // Fast and slow share only the read-only ATR series.
        let (fast, slow) = match &self.slow {
            Some(slow) => {
                let (fast, slow) = rayon::join(
                    || self.fast.run_with_atr(bars, &atr),
                    || slow.run_with_atr(bars, &atr),
                );
                (fast, Some(slow))
            }
            None => (self.fast.run_with_atr(bars, &atr), None),
        };

        let composite = match (&slow, self.config.use_dual_confirmation) {
            (Some(slow), true) => dual_composite(&fast.directions(), &slow.directions()),
            _ => single_composite(&fast.directions()),
        };
        let events = detect_crossovers(&composite, bars);

        tracing::info!(
            bars = bars.len(),
            atr_period = self.config.atr_period,
            fast_multiplier = self.config.fast_multiplier,
            slow_multiplier = ?self.config.slow_multiplier,
            dual = self.config.use_dual_confirmation,
            fast_flips = fast.flip_count(),
            events = events.len(),
            "signals generated"
        );

        Ok(SignalReport {
            config: self.config.clone(),
            fast,
            slow,
            composite,
            events,
            notices,
        })
    }
}

fn collect_notices(bars: &[Bar], required: usize) -> Vec<DataNotice> {
    let mut notices = Vec::new();
    if bars.len() < required {
        notices.push(DataNotice::InsufficientData {
            required,
            available: bars.len(),
        });
    }
    notices.extend(
        bars.iter()
            .enumerate()
            .filter(|(_, b)| b.is_malformed())
            .map(|(index, _)| DataNotice::MalformedBar { index }),
    );
    notices
}
