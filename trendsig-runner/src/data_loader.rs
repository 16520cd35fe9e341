//! Bar loading and data resolution for the runner.
//!
//! Resolves a [`DataConfig`] into a bar sequence:
//! 1. An explicit provider override wins (tests, alternate feeds)
//! 2. Otherwise the configured source: CSV file, HTTP API or synthetic
//! 3. Retryable upstream failures surface as `UpstreamDataUnavailable`
//!    so the caller can decide to try again later
//!
//! An empty bar sequence is returned as-is; downstream it yields an
//! all-undefined report, not an error.

use std::sync::Arc;
use thiserror::Error;
use trendsig_core::data::{
    read_bars_csv, CircuitBreaker, DataError, DataProvider, DataSource, HttpProvider,
    SyntheticProvider,
};
use trendsig_core::domain::Bar;

use crate::config::{DataConfig, DataSourceConfig};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("upstream data for '{symbol}' is unavailable, retry later: {source}")]
    UpstreamDataUnavailable {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::UpstreamDataUnavailable { .. })
    }
}

/// Result of loading bars, including data source provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over symbol, interval and every bar.
    pub dataset_hash: String,
}

/// Load bars for the configured symbol.
///
/// `provider` replaces the configured source when given.
pub fn load_bars(
    config: &DataConfig,
    provider: Option<&dyn DataProvider>,
) -> Result<LoadedData, LoadError> {
    let (bars, source) = match provider {
        Some(p) => fetch_from(p, config)?,
        None => match &config.source {
            DataSourceConfig::Csv { path } => {
                let bars = read_bars_csv(path)?;
                tracing::debug!(path = %path.display(), bars = bars.len(), "read CSV bars");
                (bars, DataSource::CsvImport)
            }
            DataSourceConfig::Http {
                base_url,
                token_env,
            } => {
                let provider = http_provider(base_url, token_env.as_deref())?;
                fetch_from(&provider, config)?
            }
            DataSourceConfig::Synthetic { bars, seed } => {
                fetch_from(&SyntheticProvider::new(*bars, *seed), config)?
            }
        },
    };

    let dataset_hash = compute_dataset_hash(&config.symbol, &config.interval, &bars);
    tracing::info!(
        symbol = %config.symbol,
        interval = %config.interval,
        ?source,
        bars = bars.len(),
        "bars loaded"
    );

    Ok(LoadedData {
        bars,
        source,
        dataset_hash,
    })
}

fn http_provider(base_url: &str, token_env: Option<&str>) -> Result<HttpProvider, DataError> {
    let provider = HttpProvider::new(base_url, Arc::new(CircuitBreaker::default_provider()))?;
    let Some(var) = token_env else {
        return Ok(provider);
    };
    match std::env::var(var) {
        Ok(token) if !token.is_empty() => Ok(provider.with_token(token)),
        _ => {
            tracing::warn!(var, "API token variable not set, requesting without credentials");
            Ok(provider)
        }
    }
}

fn fetch_from(
    provider: &dyn DataProvider,
    config: &DataConfig,
) -> Result<(Vec<Bar>, DataSource), LoadError> {
    if !provider.is_available() {
        return Err(LoadError::UpstreamDataUnavailable {
            symbol: config.symbol.clone(),
            source: DataError::CircuitBreakerTripped,
        });
    }
    match provider.fetch(&config.symbol, &config.interval) {
        Ok(result) => Ok((result.bars, result.source)),
        Err(e) if e.is_retryable() => {
            tracing::warn!(provider = provider.name(), symbol = %config.symbol, error = %e, "upstream unavailable");
            Err(LoadError::UpstreamDataUnavailable {
                symbol: config.symbol.clone(),
                source: e,
            })
        }
        Err(e) => Err(LoadError::Data(e)),
    }
}

/// Compute a deterministic BLAKE3 hash over all bar data.
fn compute_dataset_hash(symbol: &str, interval: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(interval.as_bytes());
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp_micros().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
