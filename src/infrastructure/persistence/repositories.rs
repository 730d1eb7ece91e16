//! SQLite implementations of the domain repository traits.
//!
//! Crate-private: outside callers go through `FunnelService`.

mod admin_repository;
mod capture_repository;
mod goal_repository;
mod observation_repository;
mod product_repository;

pub(crate) use admin_repository::SqliteAdminRepository;
pub(crate) use capture_repository::SqliteCaptureRepository;
pub(crate) use goal_repository::SqliteGoalRepository;
pub(crate) use observation_repository::SqliteObservationRepository;
pub(crate) use product_repository::SqliteProductRepository;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid uuid in column {}: {}", column, value))
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .with_context(|| format!("Invalid decimal in column {}: {}", column, value))
}
