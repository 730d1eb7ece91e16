//! Semaphore thresholds parsing from environment variables.
//!
//! Values outside the allowed ranges are clamped by `SemaphoreThresholds::new`;
//! values that do not parse as numbers are rejected.

use crate::domain::metrics::SemaphoreThresholds;
use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct SemaphoreEnvConfig {
    pub red_max: f64,
    pub yellow_max: f64,
}

impl SemaphoreEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            red_max: Self::parse_f64("SEMAPHORE_RED_MAX", SemaphoreThresholds::DEFAULT_RED)?,
            yellow_max: Self::parse_f64(
                "SEMAPHORE_YELLOW_MAX",
                SemaphoreThresholds::DEFAULT_YELLOW,
            )?,
        })
    }

    pub fn thresholds(&self) -> SemaphoreThresholds {
        SemaphoreThresholds::new(self.red_max, self.yellow_max)
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        let value = env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))?;
        if !value.is_finite() {
            anyhow::bail!("{} must be a finite number", key);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_clamped() {
        let config = SemaphoreEnvConfig {
            red_max: 0.99,
            yellow_max: 0.5,
        };
        let thresholds = config.thresholds();
        assert_eq!(thresholds.red(), 0.9);
        assert_eq!(thresholds.yellow(), 0.9);
    }
}
