//! Composite signal combination and crossover detection.

use crate::domain::{Bar, CompositeSignal, CrossoverEvent, CrossoverKind, Direction};

/// Single-instance composite: Bullish -> Long, Bearish -> Short.
pub fn single_composite(directions: &[Option<Direction>]) -> Vec<Option<CompositeSignal>> {
    directions
        .iter()
        .map(|d| d.map(CompositeSignal::from_direction))
        .collect()
}

/// Dual-confirmation composite: Long only if both Bullish, Short only if
/// both Bearish, Flat on disagreement. Undefined if either side is.
pub fn dual_composite(
    fast: &[Option<Direction>],
    slow: &[Option<Direction>],
) -> Vec<Option<CompositeSignal>> {
    debug_assert_eq!(fast.len(), slow.len());
    fast.iter()
        .zip(slow)
        .map(|(f, s)| Some(CompositeSignal::confirmed((*f)?, (*s)?)))
        .collect()
}

/// First difference of the composite series.
///
/// `None` at index 0 and wherever either the bar or its predecessor has no
/// signal; otherwise `s(i) - s(i-1)`.
pub fn position_changes(composite: &[Option<CompositeSignal>]) -> Vec<Option<i8>> {
    let mut changes = Vec::with_capacity(composite.len());
    if composite.is_empty() {
        return changes;
    }
    changes.push(None);
    changes.extend(composite.windows(2).map(|w| match (w[0], w[1]) {
        (Some(prev), Some(cur)) => Some(cur.as_i8() - prev.as_i8()),
        _ => None,
    }));
    changes
}

/// Emit a [`CrossoverEvent`] wherever the composite signal changes between
/// two consecutive bars that both carry a signal.
///
/// A bar following an undefined one never produces an event.
pub fn detect_crossovers(
    composite: &[Option<CompositeSignal>],
    bars: &[Bar],
) -> Vec<CrossoverEvent> {
    debug_assert_eq!(composite.len(), bars.len());
    composite
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| {
            let (from, to) = (w[0]?, w[1]?);
            let kind = CrossoverKind::classify(from, to)?;
            let index = i + 1;
            Some(CrossoverEvent {
                index,
                timestamp: bars[index].timestamp,
                from,
                to,
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use CompositeSignal::*;
    use Direction::*;

    #[test]
    fn single_maps_directions() {
        let c = single_composite(&[None, Some(Bullish), Some(Bearish)]);
        assert_eq!(c, vec![None, Some(Long), Some(Short)]);
    }

    #[test]
    fn dual_requires_both_defined() {
        let c = dual_composite(
            &[None, Some(Bullish), Some(Bullish), Some(Bearish)],
            &[Some(Bullish), None, Some(Bearish), Some(Bearish)],
        );
        assert_eq!(c, vec![None, None, Some(Flat), Some(Short)]);
    }

    #[test]
    fn position_changes_are_first_difference() {
        let c = [None, Some(Short), Some(Short), Some(Flat), Some(Long), Some(Short)];
        assert_eq!(
            position_changes(&c),
            vec![None, None, Some(0), Some(1), Some(1), Some(-2)]
        );
        assert!(position_changes(&[]).is_empty());
    }

    #[test]
    fn crossovers_tagged_by_transition() {
        let bars = make_bars(&[100.0; 7]);
        let c = [
            None,
            Some(Flat),
            Some(Long),
            Some(Short),
            Some(Flat),
            Some(Short),
            Some(Flat),
        ];
        let events = detect_crossovers(&c, &bars);
        let kinds: Vec<_> = events.iter().map(|e| (e.index, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (2, CrossoverKind::EnterLong),
                (3, CrossoverKind::FlipToShort),
                (4, CrossoverKind::ExitShort),
                (5, CrossoverKind::EnterShort),
                (6, CrossoverKind::ExitShort),
            ]
        );
        assert_eq!(events[1].delta(), -2);
        assert_eq!(events[0].timestamp, bars[2].timestamp);
    }

    #[test]
    fn no_event_against_undefined_predecessor() {
        let bars = make_bars(&[100.0; 5]);
        let c = [None, Some(Long), None, Some(Short), Some(Short)];
        assert!(detect_crossovers(&c, &bars).is_empty());
    }

    #[test]
    fn event_count_matches_nonzero_changes() {
        let bars = make_bars(&[100.0; 6]);
        let c = [Some(Long), Some(Long), Some(Flat), Some(Flat), Some(Short), Some(Long)];
        let events = detect_crossovers(&c, &bars);
        let nonzero = position_changes(&c)
            .iter()
            .filter(|d| matches!(d, Some(x) if *x != 0))
            .count();
        assert_eq!(events.len(), nonzero);
        assert_eq!(events.len(), 3);
    }
}
