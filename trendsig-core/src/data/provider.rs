//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (HTTP market-data API,
//! CSV files, synthetic generator) so the runner can swap implementations and
//! tests can run offline.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
///
/// Any of these means the bar sequence is unavailable as a whole; a provider
/// never hands back a partial sequence.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid interval '{0}' (expected e.g. 1m, 15m, 1h, 1d, 1w)")]
    InvalidInterval(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::RateLimited { .. }
                | DataError::CircuitBreakerTripped
        )
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Http,
    CsvImport,
    Synthetic,
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub interval: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Trait for bar sources.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the bar sequence for a symbol at a bar interval (e.g. "1d").
    ///
    /// An empty sequence is a valid answer ("no data"), not an error.
    fn fetch(&self, symbol: &str, interval: &str) -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Parse a bar interval such as "5m", "1h", "1d" or "1w".
pub fn parse_interval(interval: &str) -> Result<Duration, DataError> {
    let invalid = || DataError::InvalidInterval(interval.to_string());
    let trimmed = interval.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (count, unit) = trimmed.split_at(split);
    let count: i64 = count.parse().map_err(|_| invalid())?;
    if count <= 0 {
        return Err(invalid());
    }
    match unit {
        "m" | "min" => Ok(Duration::minutes(count)),
        "h" => Ok(Duration::hours(count)),
        "d" => Ok(Duration::days(count)),
        "w" | "wk" => Ok(Duration::weeks(count)),
        _ => Err(invalid()),
    }
}
