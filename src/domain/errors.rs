use crate::domain::access::{Action, ResourceKind};
use crate::domain::funnel::types::FunnelStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected field values, raised before anything reaches the store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    EmptyField { field: String },

    #[error("Invalid probability: {field} = {value}. Must be between 0.0 and 1.0")]
    ProbabilityOutOfRange { field: String, value: f64 },

    #[error("Invalid amount: {field} = {value}. Must not be negative")]
    NegativeAmount { field: String, value: Decimal },

    #[error("Realized amount is required once the status is Client")]
    MissingRealizedAmount,

    #[error("Unknown funnel status: {0}")]
    UnknownStatus(String),

    #[error("Unknown client category: {0}")]
    UnknownCategory(String),
}

/// Policy refusal for a request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Access denied: cannot {action} {resource}")]
pub struct AccessDenied {
    pub action: Action,
    pub resource: ResourceKind,
}

/// Errors surfaced by the funnel service
#[derive(Debug, Error)]
pub enum FunnelError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: FunnelStatus, to: FunnelStatus },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Product is not active: {0}")]
    InactiveProduct(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl FunnelError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, FunnelError::AccessDenied(_))
    }
}
