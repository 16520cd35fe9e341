//! Signal runner: wires together loading, generation and fingerprints.
//!
//! Entry points:
//! - `run_signals()`: loads bars from the configured source, then runs. Used by CLI.
//! - `run_signals_with_provider()`: same, with an explicit data provider.
//! - `run_from_bars()`: takes pre-loaded bars, no I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use trendsig_core::data::{DataProvider, DataSource};
use trendsig_core::domain::Bar;
use trendsig_core::signals::{SignalGenerator, SignalReport};
use trendsig_core::SignalError;

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_bars, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}

impl RunError {
    /// Only upstream outages are worth retrying; bad config or bad bars are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunError::Data(e) if e.is_retryable())
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single signal run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRun {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub interval: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub source: DataSource,
    pub bar_count: usize,
    /// Bar timestamps and closes, kept for export.
    pub bars: Vec<Bar>,
    pub report: SignalReport,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SignalRun {
    /// First 12 hex chars of the config hash, used for artifact directories.
    pub fn short_id(&self) -> &str {
        let end = self.config_hash.len().min(12);
        &self.config_hash[..end]
    }
}

/// Load bars for `config` and generate signals.
pub fn run_signals(config: &RunConfig) -> Result<SignalRun, RunError> {
    run_signals_with_provider(config, None)
}

/// Like [`run_signals`], but `provider` replaces the configured source.
pub fn run_signals_with_provider(
    config: &RunConfig,
    provider: Option<&dyn DataProvider>,
) -> Result<SignalRun, RunError> {
    config.validate()?;
    let loaded = load_bars(&config.data, provider)?;
    run_from_bars(config, loaded.bars, &loaded.dataset_hash, loaded.source)
}

/// Generate signals over pre-loaded bars.
pub fn run_from_bars(
    config: &RunConfig,
    bars: Vec<Bar>,
    dataset_hash: &str,
    source: DataSource,
) -> Result<SignalRun, RunError> {
    let generator = SignalGenerator::new(config.signal.clone())?;
    let report = generator.generate(&bars)?;

    let run = SignalRun {
        schema_version: SCHEMA_VERSION,
        symbol: config.data.symbol.clone(),
        interval: config.data.interval.clone(),
        config_hash: config.config_hash(),
        dataset_hash: dataset_hash.to_string(),
        source,
        bar_count: bars.len(),
        bars,
        report,
    };

    tracing::info!(
        symbol = %run.symbol,
        run = run.short_id(),
        bars = run.bar_count,
        events = run.report.events.len(),
        latest = ?run.report.latest_signal(),
        "run complete"
    );

    Ok(run)
}
