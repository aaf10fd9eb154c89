//! Engine configuration, loaded once at process start.

use crate::core::currency::CurrencyPair;
use crate::exposure::batch::DEFAULT_MAX_HORIZON_DAYS;
use crate::exposure::pfe::DEFAULT_CONFIDENCE_LEVEL;
use crate::exposure::policy::Engine;
use crate::market::rate_history::MAJOR_PAIRS;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Runtime settings for a PFE run and for queries against its store.
///
/// Every field has a default, so an empty file is a valid config:
///
/// ```
/// use fx_pfe_engine::config::EngineConfig;
/// use fx_pfe_engine::exposure::policy::Engine;
///
/// let config = EngineConfig::from_toml_str("engine = \"quic\"\nmax_horizon_days = 10").unwrap();
/// assert_eq!(config.engine, Engine::Quic);
/// assert_eq!(config.max_horizon_days, 10);
/// assert_eq!(config.confidence_level, 0.99);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Where trades and results are stored: a directory path,
    /// a `file://` URL, or `memory:`.
    pub connection_string: String,
    pub engine: Engine,
    pub confidence_level: f64,
    pub max_horizon_days: u32,
    /// Wide CSV of historical spot rates.
    pub rates_path: Option<PathBuf>,
    /// Pairs requested from the rate source.
    pub pairs: Vec<CurrencyPair>,
    pub history_start: Option<NaiveDate>,
    pub history_end: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connection_string: "data".to_string(),
            engine: Engine::default(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
            rates_path: None,
            pairs: default_pairs(),
            history_start: None,
            history_end: None,
        }
    }
}

fn default_pairs() -> Vec<CurrencyPair> {
    MAJOR_PAIRS
        .iter()
        .filter_map(|label| label.parse().ok())
        .collect()
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::Invalid {
                field: "confidence_level",
                reason: format!("{} is not strictly between 0 and 1", self.confidence_level),
            });
        }
        if self.max_horizon_days == 0 {
            return Err(ConfigError::Invalid {
                field: "max_horizon_days",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.connection_string.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "connection_string",
                reason: "must not be empty".to_string(),
            });
        }
        if self.pairs.is_empty() {
            return Err(ConfigError::Invalid {
                field: "pairs",
                reason: "at least one currency pair is required".to_string(),
            });
        }
        if let (Some(start), Some(end)) = (self.history_start, self.history_end) {
            if start > end {
                return Err(ConfigError::Invalid {
                    field: "history_start",
                    reason: format!("{} is after history_end {}", start, end),
                });
            }
        }
        Ok(())
    }

    /// The history window, open ends widened to the full calendar range.
    pub fn history_window(&self) -> (NaiveDate, NaiveDate) {
        (
            self.history_start.unwrap_or(NaiveDate::MIN),
            self.history_end.unwrap_or(NaiveDate::MAX),
        )
    }
}
