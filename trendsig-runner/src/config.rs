//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! symbol = "AAPL"
//! interval = "1d"
//!
//! [data.source]
//! type = "HTTP"
//! base_url = "https://api.fyers.in/api/v2"
//! token_env = "TRENDSIG_API_TOKEN"
//!
//! [signal]
//! atr_period = 10
//! fast_multiplier = 3.0
//! slow_multiplier = 4.0
//! use_dual_confirmation = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use trendsig_core::signals::SignalConfig;
use trendsig_core::SignalError;

/// Content-addressable identifier for a run configuration.
pub type ConfigHash = String;

pub const DEFAULT_BASE_URL: &str = "https://api.fyers.in/api/v2";
pub const DEFAULT_TOKEN_ENV: &str = "TRENDSIG_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid signal parameters: {0}")]
    Signal(#[from] SignalError),

    #[error("invalid data config: {0}")]
    Data(String),
}

/// Everything needed to reproduce one signal run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub data: DataConfig,

    #[serde(default)]
    pub signal: SignalConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Which bars to load and from where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub symbol: String,

    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default)]
    pub source: DataSourceConfig,
}

fn default_interval() -> String {
    "1d".to_string()
}

/// Bar source selection (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceConfig {
    /// A single CSV file of bars.
    Csv { path: PathBuf },

    /// Market-data HTTP API. The bearer token, if any, is read from the
    /// named environment variable at load time.
    Http {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default)]
        token_env: Option<String>,
    },

    /// Seeded random walk.
    Synthetic { bars: usize, seed: u64 },
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        DataSourceConfig::Http {
            base_url: default_base_url(),
            token_env: Some(DEFAULT_TOKEN_ENV.to_string()),
        }
    }
}

/// Where run artifacts go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signal.validate()?;
        if self.data.symbol.trim().is_empty() {
            return Err(ConfigError::Data("symbol must not be empty".into()));
        }
        trendsig_core::data::parse_interval(&self.data.interval)
            .map_err(|e| ConfigError::Data(e.to_string()))?;
        if let DataSourceConfig::Synthetic { bars: 0, .. } = self.data.source {
            return Err(ConfigError::Data("synthetic bar count must be > 0".into()));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash over the data and signal sections.
    ///
    /// The output directory is excluded so relocating artifacts does not
    /// change the identity of a run.
    pub fn config_hash(&self) -> ConfigHash {
        #[derive(Serialize)]
        struct Identity<'a> {
            data: &'a DataConfig,
            signal: &'a SignalConfig,
        }
        let identity = Identity {
            data: &self.data,
            signal: &self.signal,
        };
        // Plain structs with string keys: serialization cannot fail.
        let json = serde_json::to_string(&identity).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[data]
symbol = "AAPL"
interval = "1d"

[data.source]
type = "SYNTHETIC"
bars = 300
seed = 42

[signal]
atr_period = 10
fast_multiplier = 3.0
slow_multiplier = 4.0
use_dual_confirmation = true
"#;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.data.symbol, "AAPL");
        assert_eq!(
            config.data.source,
            DataSourceConfig::Synthetic { bars: 300, seed: 42 }
        );
        assert_eq!(config.signal, SignalConfig::default());
        assert_eq!(config.output.dir, PathBuf::from("results"));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = RunConfig::from_toml("[data]\nsymbol = \"SPY\"\n").unwrap();
        assert_eq!(config.data.interval, "1d");
        assert_eq!(config.data.source, DataSourceConfig::default());
        assert_eq!(config.signal, SignalConfig::default());
    }

    #[test]
    fn partial_signal_table_keeps_dual_defaults() {
        let absent = RunConfig::from_toml("[data]\nsymbol = \"SPY\"\n").unwrap();
        let partial =
            RunConfig::from_toml("[data]\nsymbol = \"SPY\"\n[signal]\natr_period = 10\n").unwrap();
        assert_eq!(partial.signal, absent.signal);
        assert_eq!(partial.signal.slow_multiplier, Some(4.0));
        assert!(partial.signal.use_dual_confirmation);
        assert_eq!(partial.config_hash(), absent.config_hash());
    }

    #[test]
    fn single_mode_must_be_explicit() {
        let config = RunConfig::from_toml(
            "[data]\nsymbol = \"SPY\"\n[signal]\nuse_dual_confirmation = false\n",
        )
        .unwrap();
        assert!(!config.signal.use_dual_confirmation);
        assert_eq!(config.signal.atr_period, 10);
    }

    #[test]
    fn http_source_defaults_base_url() {
        let config =
            RunConfig::from_toml("[data]\nsymbol = \"SPY\"\n[data.source]\ntype = \"HTTP\"\n")
                .unwrap();
        assert_eq!(
            config.data.source,
            DataSourceConfig::Http {
                base_url: DEFAULT_BASE_URL.to_string(),
                token_env: None,
            }
        );
    }

    #[test]
    fn invalid_signal_params_rejected() {
        let text = SAMPLE.replace("atr_period = 10", "atr_period = 0");
        assert!(matches!(
            RunConfig::from_toml(&text),
            Err(ConfigError::Signal(SignalError::InvalidParameter {
                name: "atr_period",
                ..
            }))
        ));
    }

    #[test]
    fn invalid_interval_rejected() {
        let text = SAMPLE.replace("interval = \"1d\"", "interval = \"daily\"");
        assert!(matches!(RunConfig::from_toml(&text), Err(ConfigError::Data(_))));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            RunConfig::from_toml("[data\nsymbol="),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = RunConfig::from_file(Path::new("/nonexistent/trendsig.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn config_hash_deterministic() {
        let config = RunConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.config_hash(), config.config_hash());
        assert_eq!(config.config_hash().len(), 64);
    }

    #[test]
    fn config_hash_changes_with_params_but_not_output() {
        let a = RunConfig::from_toml(SAMPLE).unwrap();

        let mut b = a.clone();
        b.signal.fast_multiplier = 2.5;
        assert_ne!(a.config_hash(), b.config_hash());

        let mut c = a.clone();
        c.output.dir = PathBuf::from("elsewhere");
        assert_eq!(a.config_hash(), c.config_hash());
    }
}
