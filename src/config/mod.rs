//! Configuration management for statframe
//!
//! Test thresholds and reporting precision can be supplied from:
//! - built-in defaults
//! - YAML/TOML configuration files or strings
//! - environment variables (`STATFRAME_*`)
//!
//! Every loaded configuration is validated before use.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod loader;
pub mod validation;

/// Settings shared by every test in the crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Significance level for assumption checks (sphericity, normality, ...)
    pub alpha: f64,
    /// Significance level of the Mauchly test run inside the repeated-measures ANOVA
    pub sphericity_alpha: f64,
    /// Cells below this count trigger a low-frequency warning
    pub low_count_threshold: f64,
    /// Decimal places used when rounding reported statistics
    pub decimals: u32,
    /// Apply continuity corrections (Yates / Edwards) where they are defined
    pub correction: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            sphericity_alpha: 0.01,
            low_count_threshold: 5.0,
            decimals: 3,
            correction: true,
        }
    }
}

impl StatsConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        loader::load_from_env()
    }

    /// Load configuration from a file (YAML or TOML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        loader::load_from_file(path.as_ref())
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        loader::load_from_yaml(yaml)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        loader::load_from_toml(toml)
    }

    /// Load configuration with precedence: defaults -> file -> env
    pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        loader::load_with_precedence(config_file)
    }

    /// Validate configuration and return errors if invalid
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        loader::save_to_file(self, path.as_ref())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to YAML: {}", e))
        })
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to TOML: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StatsConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.sphericity_alpha, 0.01);
        assert_eq!(config.low_count_threshold, 5.0);
        assert_eq!(config.decimals, 3);
        assert!(config.correction);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_keeps_overrides() {
        let config = StatsConfig {
            alpha: 0.1,
            decimals: 4,
            ..StatsConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(StatsConfig::from_toml(&text).unwrap(), config);
    }
}
