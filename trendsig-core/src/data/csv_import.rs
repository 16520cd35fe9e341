//! CSV bar files: import, export, and a directory-backed provider.
//!
//! Layout: header `timestamp,open,high,low,close,volume`, RFC 3339
//! timestamps, empty cells for missing values.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            timestamp: row.timestamp,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close: row.close.unwrap_or(f64::NAN),
            volume: row.volume.unwrap_or(0.0),
        }
    }
}

impl From<&Bar> for CsvRow {
    fn from(bar: &Bar) -> Self {
        let finite = |v: f64| v.is_finite().then_some(v);
        CsvRow {
            timestamp: bar.timestamp,
            open: finite(bar.open),
            high: finite(bar.high),
            low: finite(bar.low),
            close: finite(bar.close),
            volume: Some(bar.volume),
        }
    }
}

/// Read bars from any CSV source.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<CsvRow>()
        .map(|row| Ok(Bar::from(row?)))
        .collect()
}

/// Write bars as CSV.
pub fn write_bars<W: Write>(writer: W, bars: &[Bar]) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for bar in bars {
        wtr.serialize(CsvRow::from(bar))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = std::fs::File::open(path)?;
    read_bars(file)
}

pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_bars(file, bars)
}

/// Provider over a directory of `{symbol}_{interval}.csv` files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, interval: &str) -> PathBuf {
        self.dir.join(format!("{symbol}_{interval}.csv"))
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, interval: &str) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol, interval);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = read_bars_csv(&path)?;
        tracing::debug!(path = %path.display(), bars = bars.len(), "loaded CSV bars");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
