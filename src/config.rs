//! Configuration module for the sales funnel.
//!
//! Structured configuration loading from environment variables, organized by
//! concern: database and semaphore, plus a few core settings.

mod database_config;
mod semaphore_config;

pub use database_config::{DEFAULT_DATABASE_URL, DatabaseEnvConfig};
pub use semaphore_config::SemaphoreEnvConfig;

use crate::domain::funnel::DEFAULT_CAPTURE_LIMIT;
use crate::domain::metrics::SemaphoreThresholds;
use anyhow::{Context, Result};
use std::env;

/// Main application configuration.
///
/// Aggregates all sub-configs; call after `dotenvy::dotenv()` so `.env`
/// values are visible.
#[derive(Debug, Clone)]
pub struct Config {
    // Core
    pub app_name: String,
    pub capture_query_limit: usize,

    // Database (from DatabaseEnvConfig)
    pub database_url: String,
    pub database_max_connections: u32,

    // Semaphore (from SemaphoreEnvConfig)
    pub thresholds: SemaphoreThresholds,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "Sales Funnel".to_string());

        let capture_query_limit = env::var("CAPTURE_QUERY_LIMIT")
            .unwrap_or_else(|_| DEFAULT_CAPTURE_LIMIT.to_string())
            .parse::<usize>()
            .context("Failed to parse CAPTURE_QUERY_LIMIT")?;
        if capture_query_limit == 0 {
            anyhow::bail!("CAPTURE_QUERY_LIMIT must be at least 1");
        }

        let database = DatabaseEnvConfig::from_env().context("Failed to load database config")?;
        let semaphore =
            SemaphoreEnvConfig::from_env().context("Failed to load semaphore config")?;

        Ok(Self {
            app_name,
            capture_query_limit,
            database_url: database.url,
            database_max_connections: database.max_connections,
            thresholds: semaphore.thresholds(),
        })
    }
}
