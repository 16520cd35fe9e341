//! Trend direction, composite signal, and crossover event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supertrend direction. Exactly one of two values once initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// +1 for Bullish, -1 for Bearish.
    ///
    /// Only the signal-combination step should need the numeric form.
    pub fn as_sign(self) -> i8 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => -1,
        }
    }
}

/// Combined directional output of one or two Supertrend instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositeSignal {
    Short,
    Flat,
    Long,
}

impl CompositeSignal {
    pub fn as_i8(self) -> i8 {
        match self {
            CompositeSignal::Short => -1,
            CompositeSignal::Flat => 0,
            CompositeSignal::Long => 1,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(CompositeSignal::Short),
            0 => Some(CompositeSignal::Flat),
            1 => Some(CompositeSignal::Long),
            _ => None,
        }
    }

    /// Single-instance mapping: Bullish is long, Bearish is short.
    pub fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => CompositeSignal::Long,
            Direction::Bearish => CompositeSignal::Short,
        }
    }

    /// Dual-confirmation mapping: both must agree, disagreement is flat.
    pub fn confirmed(fast: Direction, slow: Direction) -> Self {
        match (fast, slow) {
            (Direction::Bullish, Direction::Bullish) => CompositeSignal::Long,
            (Direction::Bearish, Direction::Bearish) => CompositeSignal::Short,
            _ => CompositeSignal::Flat,
        }
    }
}

/// What a change in composite signal means for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossoverKind {
    /// Flat -> Long
    EnterLong,
    /// Flat -> Short
    EnterShort,
    /// Long -> Flat
    ExitLong,
    /// Short -> Flat
    ExitShort,
    /// Short -> Long
    FlipToLong,
    /// Long -> Short
    FlipToShort,
}

impl CrossoverKind {
    /// Classify a transition. `None` when the signal did not change.
    pub fn classify(from: CompositeSignal, to: CompositeSignal) -> Option<Self> {
        use CompositeSignal::*;
        match (from, to) {
            (Flat, Long) => Some(CrossoverKind::EnterLong),
            (Flat, Short) => Some(CrossoverKind::EnterShort),
            (Long, Flat) => Some(CrossoverKind::ExitLong),
            (Short, Flat) => Some(CrossoverKind::ExitShort),
            (Short, Long) => Some(CrossoverKind::FlipToLong),
            (Long, Short) => Some(CrossoverKind::FlipToShort),
            (Long, Long) | (Flat, Flat) | (Short, Short) => None,
        }
    }

    /// True when the transition ends flat.
    pub fn is_exit(self) -> bool {
        matches!(self, CrossoverKind::ExitLong | CrossoverKind::ExitShort)
    }
}

/// A change in composite signal between two consecutive bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub from: CompositeSignal,
    pub to: CompositeSignal,
    pub kind: CrossoverKind,
}

impl CrossoverEvent {
    /// First difference of the signal: to - from, in {-2, -1, 1, 2}.
    pub fn delta(&self) -> i8 {
        self.to.as_i8() - self.from.as_i8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Bullish.as_sign(), 1);
        assert_eq!(Direction::Bearish.as_sign(), -1);
    }

    #[test]
    fn composite_i8_roundtrip() {
        for s in [CompositeSignal::Short, CompositeSignal::Flat, CompositeSignal::Long] {
            assert_eq!(CompositeSignal::from_i8(s.as_i8()), Some(s));
        }
        assert_eq!(CompositeSignal::from_i8(2), None);
    }

    #[test]
    fn confirmation_requires_agreement() {
        use Direction::*;
        assert_eq!(CompositeSignal::confirmed(Bullish, Bullish), CompositeSignal::Long);
        assert_eq!(CompositeSignal::confirmed(Bearish, Bearish), CompositeSignal::Short);
        assert_eq!(CompositeSignal::confirmed(Bullish, Bearish), CompositeSignal::Flat);
        assert_eq!(CompositeSignal::confirmed(Bearish, Bullish), CompositeSignal::Flat);
    }

    #[test]
    fn classify_all_transitions() {
        use CompositeSignal::*;
        assert_eq!(CrossoverKind::classify(Flat, Long), Some(CrossoverKind::EnterLong));
        assert_eq!(CrossoverKind::classify(Flat, Short), Some(CrossoverKind::EnterShort));
        assert_eq!(CrossoverKind::classify(Long, Flat), Some(CrossoverKind::ExitLong));
        assert_eq!(CrossoverKind::classify(Short, Flat), Some(CrossoverKind::ExitShort));
        assert_eq!(CrossoverKind::classify(Short, Long), Some(CrossoverKind::FlipToLong));
        assert_eq!(CrossoverKind::classify(Long, Short), Some(CrossoverKind::FlipToShort));
        assert_eq!(CrossoverKind::classify(Long, Long), None);
        assert!(CrossoverKind::ExitShort.is_exit());
        assert!(!CrossoverKind::FlipToLong.is_exit());
    }
}
