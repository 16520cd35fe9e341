//! HTTP market-data provider.
//!
//! Fetches bars from a REST endpoint of the form
//! `{base_url}/data/{symbol}?interval={interval}` whose JSON body is
//! `{"data": [{"timestamp": ..., "open": ..., ...}, ...]}`. Handles retries
//! with exponential backoff, response parsing, and the circuit breaker.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct BarsResponse {
    data: Option<Vec<BarRecord>>,
    #[serde(default)]
    message: Option<String>,
}

/// Epoch seconds or an RFC 3339 string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: RawTimestamp,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl RawTimestamp {
    fn to_utc(&self) -> Result<DateTime<Utc>, DataError> {
        match self {
            RawTimestamp::Epoch(secs) => DateTime::from_timestamp(*secs, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {secs}"))
            }),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp '{s}': {e}"))
                }),
        }
    }
}

pub struct HttpProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

const MAX_BACKOFF_EXPONENT: u32 = 16;

impl HttpProvider {
    pub fn new(
        base_url: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn bars_url(&self, symbol: &str, interval: &str) -> String {
        format!("{}/data/{symbol}?interval={interval}", self.base_url)
    }

    /// Parse a response body into bars. Missing OHLC values become NaN.
    fn parse_response(symbol: &str, resp: BarsResponse) -> Result<Vec<Bar>, DataError> {
        let records = resp.data.ok_or_else(|| {
            DataError::ResponseFormatChanged(format!(
                "no `data` field for {symbol}{}",
                resp.message.map(|m| format!(": {m}")).unwrap_or_default()
            ))
        })?;

        records
            .into_iter()
            .map(|r| {
                Ok(Bar {
                    timestamp: r.timestamp.to_utc()?,
                    open: r.open.unwrap_or(f64::NAN),
                    high: r.high.unwrap_or(f64::NAN),
                    low: r.low.unwrap_or(f64::NAN),
                    close: r.close.unwrap_or(f64::NAN),
                    volume: r.volume.unwrap_or(0.0),
                })
            })
            .collect()
    }

    fn fetch_with_retry(&self, symbol: &str, interval: &str) -> Result<Vec<Bar>, DataError> {
        let url = self.bars_url(symbol, interval);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::debug!(attempt, ?delay, %symbol, "retrying market data request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let mut request = self.client.get(&url);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let resp = match request.send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();
                    return Err(DataError::Other(format!("request to {url} failed: {e}")));
                }
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(format!(
                    "{} rejected the credentials",
                    self.base_url
                )));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body: BarsResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, body)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating
/// instead of overflowing for large attempt counts.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    base.saturating_mul(1u32 << exponent)
}

impl DataProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, symbol: &str, interval: &str) -> Result<FetchResult, DataError> {
        let bars = self.fetch_with_retry(symbol, interval)?;
        tracing::info!(%symbol, %interval, bars = bars.len(), "fetched market data");
        if bars.is_empty() {
            tracing::warn!(%symbol, %interval, "provider returned no bars");
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            bars,
            source: DataSource::Http,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Bar>, DataError> {
        let resp: BarsResponse = serde_json::from_str(json).unwrap();
        HttpProvider::parse_response("AAPL", resp)
    }

    #[test]
    fn parses_epoch_and_rfc3339_timestamps() {
        let bars = parse(
            r#"{"data":[
                {"timestamp":1704153600,"open":1,"high":2,"low":0.5,"close":1.5,"volume":100},
                {"timestamp":"2024-01-03T00:00:00Z","open":1.5,"high":2.5,"low":1,"close":2}
            ]}"#,
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert_eq!(bars[1].close, 2.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn missing_fields_become_malformed_bars() {
        let bars = parse(r#"{"data":[{"timestamp":1704153600,"open":1,"high":2,"low":null}]}"#)
            .unwrap();
        assert!(bars[0].is_malformed());
        assert!(bars[0].close.is_nan());
    }

    #[test]
    fn empty_data_is_not_an_error() {
        assert!(parse(r#"{"data":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn missing_data_field_is_format_error() {
        let err = parse(r#"{"message":"invalid symbol"}"#).unwrap_err();
        match err {
            DataError::ResponseFormatChanged(msg) => assert!(msg.contains("invalid symbol")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_timestamp_is_format_error() {
        let err = parse(r#"{"data":[{"timestamp":"yesterday","close":1}]}"#).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn url_layout() {
        let cb = Arc::new(CircuitBreaker::default_provider());
        let provider = HttpProvider::new("https://api.example.com/v2/", cb).unwrap();
        assert_eq!(
            provider.bars_url("AAPL", "1d"),
            "https://api.example.com/v2/data/AAPL?interval=1d"
        );
    }

    #[test]
    fn tripped_breaker_refuses_without_network() {
        let cb = Arc::new(CircuitBreaker::default_provider());
        cb.trip();
        let provider = HttpProvider::new("http://127.0.0.1:9", cb).unwrap();
        assert!(!provider.is_available());
        assert!(matches!(
            provider.fetch("AAPL", "1d"),
            Err(DataError::CircuitBreakerTripped)
        ));
    }

    #[test]
    fn backoff_doubles_then_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 4), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 40), backoff_delay(base, 17));
        assert_eq!(backoff_delay(base, u32::MAX), base * (1 << MAX_BACKOFF_EXPONENT));
        assert_eq!(backoff_delay(Duration::MAX, 3), Duration::MAX);
    }

    #[test]
    fn invalid_request_is_not_retried_and_counts_as_failure() {
        let cb = Arc::new(CircuitBreaker::new(Duration::from_secs(60), 1));
        let provider = HttpProvider::new("not a url", Arc::clone(&cb))
            .unwrap()
            .with_retries(5, Duration::from_secs(30));
        let err = provider.fetch("AAPL", "1d").unwrap_err();
        assert!(matches!(err, DataError::Other(_)));
        assert!(!err.is_retryable());
        assert!(!cb.is_allowed());
    }
}
