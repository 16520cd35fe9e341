//! Synthetic bars for offline runs and demos.
//!
//! A seeded random walk starting at 100.0. Same seed, same bars.

use super::provider::{parse_interval, DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `n` bars spaced by `step`, starting at `start`.
pub fn synthetic_bars(n: usize, seed: u64, start: DateTime<Utc>, step: Duration) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0_f64;
    let mut timestamp = start;

    (0..n)
        .map(|_| {
            let ret: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

            let bar = Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            };
            price = close;
            timestamp += step;
            bar
        })
        .collect()
}

/// Provider that fabricates a fixed number of bars per request.
///
/// The seed is mixed with the symbol so different symbols get different walks.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    bars: usize,
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(bars: usize, seed: u64) -> Self {
        Self { bars, seed }
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        // FNV-1a
        symbol.bytes().fold(self.seed ^ 0xcbf2_9ce4_8422_2325, |h, b| {
            (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, interval: &str) -> Result<FetchResult, DataError> {
        let step = parse_interval(interval)?;
        let start = Utc
            .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
            .single()
            .ok_or_else(|| DataError::Other("invalid synthetic start date".into()))?;
        tracing::warn!(%symbol, bars = self.bars, "generating synthetic bars");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            bars: synthetic_bars(self.bars, self.symbol_seed(symbol), start, step),
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
