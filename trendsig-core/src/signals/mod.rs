//! Composite signal generation on top of the Supertrend engine.

pub mod crossover;
pub mod generator;

pub use crossover::{detect_crossovers, dual_composite, position_changes, single_composite};
pub use generator::{SignalConfig, SignalGenerator, SignalReport};
