//! TrendSig Runner: run orchestration on top of `trendsig-core`.
//!
//! This crate provides:
//! - TOML run configuration with BLAKE3 config fingerprints
//! - Bar loading from CSV, HTTP or synthetic sources
//! - Single-run orchestration producing a `SignalRun`
//! - Artifact export (signals CSV, events JSON, manifest)
//! - Logging initialization

pub mod config;
pub mod data_loader;
pub mod export;
pub mod logging;
pub mod runner;

pub use config::{ConfigError, DataConfig, DataSourceConfig, OutputConfig, RunConfig};
pub use data_loader::{load_bars, LoadError, LoadedData};
pub use export::{save_artifacts, Manifest};
pub use logging::{init_logging, LogFormat};
pub use runner::{run_from_bars, run_signals, run_signals_with_provider, RunError, SignalRun};
