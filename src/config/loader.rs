//! Configuration loading utilities
//!
//! This module handles loading configuration from various sources with proper
//! precedence and validation.

use super::*;
use crate::core::error::{Error, Result};
use std::env;
use std::fs;
use std::path::Path;

/// Load configuration from environment variables
pub fn load_from_env() -> Result<StatsConfig> {
    let mut config = StatsConfig::default();
    apply_overrides(&mut config, |key| env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Overlay `STATFRAME_*` variables, resolved through `lookup`, onto `config`
pub fn apply_overrides<F>(config: &mut StatsConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(alpha) = lookup("STATFRAME_ALPHA") {
        config.alpha = parse_var("STATFRAME_ALPHA", &alpha)?;
    }

    if let Some(alpha) = lookup("STATFRAME_SPHERICITY_ALPHA") {
        config.sphericity_alpha = parse_var("STATFRAME_SPHERICITY_ALPHA", &alpha)?;
    }

    if let Some(threshold) = lookup("STATFRAME_LOW_COUNT_THRESHOLD") {
        config.low_count_threshold = parse_var("STATFRAME_LOW_COUNT_THRESHOLD", &threshold)?;
    }

    if let Some(decimals) = lookup("STATFRAME_DECIMALS") {
        config.decimals = parse_var("STATFRAME_DECIMALS", &decimals)?;
    }

    if let Some(correction) = lookup("STATFRAME_CORRECTION") {
        config.correction = parse_var("STATFRAME_CORRECTION", &correction)?;
    }

    Ok(())
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::ConfigurationError(format!("Invalid {}: {}", name, e)))
}

/// Load configuration from a file (YAML or TOML based on extension)
pub fn load_from_file(path: &Path) -> Result<StatsConfig> {
    let config = parse_file(path)?;
    config.validate()?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<StatsConfig> {
    if !path.exists() {
        return Err(Error::ConfigurationError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        Error::ConfigurationError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("toml") => parse_toml(&contents),
        Some(ext) => Err(Error::ConfigurationError(format!(
            "Unsupported config file format: {}",
            ext
        ))),
        None => parse_yaml(&contents).or_else(|_| parse_toml(&contents)),
    }
}

/// Load configuration from YAML string
pub fn load_from_yaml(yaml: &str) -> Result<StatsConfig> {
    let config = parse_yaml(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from TOML string
pub fn load_from_toml(toml: &str) -> Result<StatsConfig> {
    let config = parse_toml(toml)?;
    config.validate()?;
    Ok(config)
}

fn parse_yaml(yaml: &str) -> Result<StatsConfig> {
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigurationError(format!("Failed to parse YAML config: {}", e)))
}

fn parse_toml(toml: &str) -> Result<StatsConfig> {
    toml::from_str(toml)
        .map_err(|e| Error::ConfigurationError(format!("Failed to parse TOML config: {}", e)))
}

/// Load configuration with precedence: defaults -> file -> environment
pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<StatsConfig> {
    // Missing keys in the file fall back to defaults through #[serde(default)]
    let mut config = match config_file {
        Some(file_path) => parse_file(file_path.as_ref())?,
        None => StatsConfig::default(),
    };

    apply_overrides(&mut config, |key| env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

/// Save configuration to a file
pub fn save_to_file(config: &StatsConfig, path: &Path) -> Result<()> {
    let contents = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => config.to_yaml()?,
        Some("toml") => config.to_toml()?,
        Some(ext) => {
            return Err(Error::ConfigurationError(format!(
                "Unsupported config file format: {}",
                ext
            )))
        }
        None => config.to_yaml()?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    fs::write(path, contents).map_err(|e| {
        Error::ConfigurationError(format!(
            "Failed to write config file {}: {}",
            path.display(),
            e
        ))
    })
}
