//! Market-data sources: HTTP, CSV files, synthetic.

pub mod circuit_breaker;
pub mod csv_import;
pub mod http;
pub mod provider;
pub mod synthetic;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_import::{read_bars, read_bars_csv, write_bars, write_bars_csv, CsvProvider};
pub use http::HttpProvider;
pub use provider::{parse_interval, DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::{synthetic_bars, SyntheticProvider};
