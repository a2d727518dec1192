//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file (or `EngineConfig::default()`)
//! is a complete configuration:
//!
//! ```toml
//! strategy_timeout_ms = 800
//! request_deadline_ms = 1500
//!
//! [weights]
//! ai = 0.4
//! location = 0.25
//! popularity = 0.15
//! collaborative = 0.2
//!
//! [analyzer]
//! positive_rating = 4.0
//! ```

use pipeline::{StrategyWeights, WeightsError};
use serde::Deserialize;
use sources::AnalyzerSettings;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Weights(#[from] WeightsError),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: StrategyWeights,
    /// Independent timeout for each strategy call
    pub strategy_timeout_ms: u64,
    /// Shared fan-in deadline for one request
    pub request_deadline_ms: u64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_radius_meters: f64,
    pub max_radius_meters: f64,
    /// Cap on candidates each strategy contributes
    pub candidates_per_strategy: usize,
    /// Analyze a missing taste profile on demand
    pub lazy_profile_analysis: bool,
    pub analyzer: AnalyzerSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: StrategyWeights::default(),
            strategy_timeout_ms: 800,
            request_deadline_ms: 1_500,
            default_limit: 10,
            max_limit: 50,
            default_radius_meters: 3_000.0,
            max_radius_meters: 20_000.0,
            candidates_per_strategy: 100,
            lazy_profile_analysis: true,
            analyzer: AnalyzerSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        if self.strategy_timeout_ms == 0 {
            return Err(invalid("strategy_timeout_ms", "must be positive"));
        }
        if self.request_deadline_ms == 0 {
            return Err(invalid("request_deadline_ms", "must be positive"));
        }
        if self.max_limit == 0 {
            return Err(invalid("max_limit", "must be positive"));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(invalid(
                "default_limit",
                format!("must be within 1..={}", self.max_limit),
            ));
        }
        if !(self.max_radius_meters.is_finite() && self.max_radius_meters > 0.0) {
            return Err(invalid("max_radius_meters", "must be a positive number"));
        }
        if !(self.default_radius_meters > 0.0 && self.default_radius_meters <= self.max_radius_meters) {
            return Err(invalid(
                "default_radius_meters",
                format!("must be within (0, {}]", self.max_radius_meters),
            ));
        }
        if self.candidates_per_strategy == 0 {
            return Err(invalid("candidates_per_strategy", "must be positive"));
        }
        Ok(())
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.strategy_timeout(), Duration::from_millis(800));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            request_deadline_ms = 300
            lazy_profile_analysis = false

            [weights]
            ai = 0.6
            location = 0.4
            popularity = 0.0
            collaborative = 0.0

            [analyzer]
            top_tags = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.request_deadline(), Duration::from_millis(300));
        assert!(!config.lazy_profile_analysis);
        assert_eq!(config.weights.ai, 0.6);
        assert_eq!(config.analyzer.top_tags, 3);
        assert_eq!(config.analyzer.positive_rating, 4.0);
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let err = EngineConfig::from_toml_str("[weights]\nai = 0.9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Weights(_)));
    }

    #[test]
    fn test_rejects_limits_out_of_order() {
        let err = EngineConfig::from_toml_str("default_limit = 80\nmax_limit = 50\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "default_limit", .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/plate-recs.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
