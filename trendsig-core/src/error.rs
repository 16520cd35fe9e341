//! Signal computation errors and non-fatal data notices.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors: the whole computation is aborted and nothing is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("timestamps must be strictly ascending (violation at bar {index})")]
    NonAscendingTimestamps { index: usize },
}

impl SignalError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SignalError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions attached to an otherwise successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataNotice {
    /// Fewer bars than the ATR period needs; every output is undefined.
    InsufficientData { required: usize, available: usize },
    /// Missing or NaN OHLC; values depending on this bar are undefined.
    MalformedBar { index: usize },
}

impl std::fmt::Display for DataNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataNotice::InsufficientData {
                required,
                available,
            } => write!(f, "insufficient data: need {required} bars, have {available}"),
            DataNotice::MalformedBar { index } => write!(f, "malformed bar at index {index}"),
        }
    }
}

/// Validate an ATR period.
pub fn check_period(period: usize) -> Result<(), SignalError> {
    if period == 0 {
        return Err(SignalError::invalid("atr_period", "must be >= 1"));
    }
    Ok(())
}

/// Validate a band multiplier.
pub fn check_multiplier(name: &'static str, multiplier: f64) -> Result<(), SignalError> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(SignalError::invalid(
            name,
            format!("must be a positive finite number, got {multiplier}"),
        ));
    }
    Ok(())
}
