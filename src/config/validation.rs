//! Configuration validation utilities

use super::*;
use crate::core::error::{Error, Result};

/// Largest number of decimals that still changes an f64 when rounding
const MAX_DECIMALS: u32 = 15;

/// Validate the entire configuration
pub fn validate_config(config: &StatsConfig) -> Result<()> {
    validate_alpha("alpha", config.alpha)?;
    validate_alpha("sphericity_alpha", config.sphericity_alpha)?;

    if !config.low_count_threshold.is_finite() || config.low_count_threshold < 0.0 {
        return Err(Error::ConfigurationError(format!(
            "low_count_threshold must be a non-negative number, got {}",
            config.low_count_threshold
        )));
    }

    if config.decimals > MAX_DECIMALS {
        return Err(Error::ConfigurationError(format!(
            "decimals must be at most {}, got {}",
            MAX_DECIMALS, config.decimals
        )));
    }

    if config.sphericity_alpha > config.alpha {
        log::warn!(
            "sphericity_alpha ({}) is looser than alpha ({})",
            config.sphericity_alpha,
            config.alpha
        );
    }

    Ok(())
}

fn validate_alpha(name: &str, alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::ConfigurationError(format!(
            "{} must lie strictly between 0 and 1, got {}",
            name, alpha
        )));
    }
    Ok(())
}
