//! Property tests for Supertrend and signal invariants.
//!
//! Uses proptest to verify:
//! 1. Direction is defined for every bar from the ATR period on
//! 2. Ratchet monotonicity: bands only tighten unless breached
//! 3. Determinism: identical input, identical output
//! 4. Dual confirmation: disagreement is always flat
//! 5. Event accounting: one event per composite change, none before period + 1

use chrono::TimeZone;
use proptest::prelude::*;
use trendsig_core::domain::{Bar, CompositeSignal};
use trendsig_core::indicators::SupertrendEngine;
use trendsig_core::signals::{position_changes, SignalConfig, SignalGenerator};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random-walk bars built from per-bar returns and range fractions.
fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-0.05..0.05_f64, 0.0..0.03_f64, 0.0..0.03_f64), 2..150).prop_map(
        |steps| {
            let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
            let mut price = 100.0_f64;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (ret, up, down))| {
                    let open = price;
                    let close = price * (1.0 + ret);
                    price = close;
                    Bar {
                        timestamp: base + chrono::Duration::days(i as i64),
                        open,
                        high: open.max(close) * (1.0 + up),
                        low: open.min(close) * (1.0 - down),
                        close,
                        volume: 1000.0,
                    }
                })
                .collect()
        },
    )
}

fn arb_period() -> impl Strategy<Value = usize> {
    1..20usize
}

fn arb_multiplier() -> impl Strategy<Value = f64> {
    (0.5..5.0_f64).prop_map(|m| (m * 10.0).round() / 10.0)
}

// ── 1. Direction coverage ────────────────────────────────────────────

proptest! {
    #[test]
    fn direction_defined_from_period_on(
        bars in arb_bars(),
        period in arb_period(),
        mult in arb_multiplier(),
    ) {
        let series = SupertrendEngine::new(period, mult).unwrap().run(&bars);
        prop_assert_eq!(series.len(), bars.len());
        for i in 0..bars.len() {
            if i < period {
                prop_assert!(series.states[i].is_none(), "state before period at {}", i);
            } else {
                prop_assert!(series.states[i].is_some(), "missing state at {}", i);
            }
        }
    }
}

// ── 2. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    #[test]
    fn bands_ratchet_unless_breached(
        bars in arb_bars(),
        period in arb_period(),
        mult in arb_multiplier(),
    ) {
        let series = SupertrendEngine::new(period, mult).unwrap().run(&bars);
        for i in (period + 1)..bars.len() {
            let prev = series.states[i - 1].unwrap();
            let cur = series.states[i].unwrap();
            let prev_close = bars[i - 1].close;
            if prev_close >= prev.final_lower {
                prop_assert!(cur.final_lower >= prev.final_lower, "lower stepped down at {}", i);
            }
            if prev_close <= prev.final_upper {
                prop_assert!(cur.final_upper <= prev.final_upper, "upper stepped up at {}", i);
            }
        }
    }

    /// The trend value is always the band on the side of the direction.
    #[test]
    fn trend_value_follows_direction(
        bars in arb_bars(),
        period in arb_period(),
        mult in arb_multiplier(),
    ) {
        use trendsig_core::domain::Direction;
        let series = SupertrendEngine::new(period, mult).unwrap().run(&bars);
        for s in series.states.iter().flatten() {
            match s.direction {
                Direction::Bullish => prop_assert_eq!(s.trend_value, s.final_lower),
                Direction::Bearish => prop_assert_eq!(s.trend_value, s.final_upper),
            }
        }
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn identical_input_identical_output(
        bars in arb_bars(),
        period in arb_period(),
    ) {
        let gen = SignalGenerator::new(SignalConfig::dual(period, 2.0, 3.0)).unwrap();
        let a = gen.generate(&bars).unwrap();
        let b = gen.generate(&bars).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ── 4. Dual confirmation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn disagreement_is_flat(
        bars in arb_bars(),
        period in arb_period(),
        fast in arb_multiplier(),
        extra in 0.1..3.0_f64,
    ) {
        let gen = SignalGenerator::new(SignalConfig::dual(period, fast, fast + extra)).unwrap();
        let report = gen.generate(&bars).unwrap();
        let slow = report.slow.as_ref().unwrap();
        for i in 0..bars.len() {
            match (report.fast.direction(i), slow.direction(i)) {
                (Some(f), Some(s)) if f != s => {
                    prop_assert_eq!(report.composite[i], Some(CompositeSignal::Flat));
                }
                (Some(_), Some(_)) => {
                    prop_assert_ne!(report.composite[i], Some(CompositeSignal::Flat));
                }
                _ => prop_assert_eq!(report.composite[i], None),
            }
        }
    }
}

// ── 5. Event accounting ──────────────────────────────────────────────

proptest! {
    #[test]
    fn one_event_per_signal_change(
        bars in arb_bars(),
        period in arb_period(),
        dual in any::<bool>(),
    ) {
        let config = if dual {
            SignalConfig::dual(period, 1.5, 3.0)
        } else {
            SignalConfig::single(period, 1.5)
        };
        let report = SignalGenerator::new(config).unwrap().generate(&bars).unwrap();
        let changes = position_changes(&report.composite)
            .into_iter()
            .filter(|d| matches!(d, Some(x) if *x != 0))
            .count();
        prop_assert_eq!(report.events.len(), changes);
        for e in &report.events {
            prop_assert!(e.index >= period + 1);
            prop_assert_ne!(e.from, e.to);
            prop_assert_eq!(report.composite[e.index], Some(e.to));
            prop_assert_eq!(report.composite[e.index - 1], Some(e.from));
        }
    }
}
