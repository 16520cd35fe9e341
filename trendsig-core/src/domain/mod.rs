//! Domain types for TrendSig

pub mod bar;
pub mod signal;

pub use bar::{validate_bars, Bar};
pub use signal::{CompositeSignal, CrossoverEvent, CrossoverKind, Direction};

/// Symbol type alias
pub type Symbol = String;
