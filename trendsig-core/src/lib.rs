//! TrendSig Core: Supertrend indicator and composite signal generation.
//!
//! This crate contains:
//! - Domain types (bars, directions, composite signals, crossover events)
//! - True range, ATR, SMA and band calculations
//! - The Supertrend recurrence (band ratchet + direction hysteresis)
//! - Single or dual-confirmation signal generator with crossover detection
//! - Market-data providers (HTTP, CSV, synthetic) behind one trait

pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod signals;

pub use error::{DataNotice, SignalError};
