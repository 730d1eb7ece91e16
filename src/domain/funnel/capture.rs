use crate::domain::errors::{FunnelError, ValidationError};
use crate::domain::funnel::types::{ClientCategory, FunnelStatus, Probability, first_of_month};
use crate::domain::identity::Identity;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked lead or client, owned by the advisor who logged it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub advisor: String,
    pub client: String,
    pub reference: Option<String>,
    pub product: String,
    pub expected_amount: Decimal,
    pub realized_amount: Option<Decimal>,
    /// Day the lead was logged
    pub capture_date: NaiveDate,
    /// Always the first day of a month
    pub expected_close_month: NaiveDate,
    pub visit_date: Option<NaiveDate>,
    pub category: ClientCategory,
    pub status: FunnelStatus,
    pub probability_adjusted: Option<Probability>,
}

/// Intake form for a new capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCapture {
    pub client: String,
    pub reference: Option<String>,
    pub product: String,
    pub expected_amount: Decimal,
    pub expected_close_month: NaiveDate,
    pub capture_date: Option<NaiveDate>,
    pub visit_date: Option<NaiveDate>,
    pub category: ClientCategory,
    pub status: FunnelStatus,
    pub probability_adjusted: Option<f64>,
    pub realized_amount: Option<Decimal>,
}

/// Changes an owner may make as the lead progresses. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureUpdate {
    pub status: Option<FunnelStatus>,
    pub realized_amount: Option<Decimal>,
    pub probability_adjusted: Option<f64>,
    pub expected_amount: Option<Decimal>,
    pub expected_close_month: Option<NaiveDate>,
    pub visit_date: Option<NaiveDate>,
    pub reference: Option<String>,
}

impl CaptureRecord {
    /// Build a validated record owned by `owner`.
    pub fn create(
        owner: &Identity,
        new: NewCapture,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let probability_adjusted = new
            .probability_adjusted
            .map(|p| Probability::new("probability_adjusted", p))
            .transpose()?;

        let record = Self {
            id: Uuid::new_v4(),
            created_at: now,
            user_id: owner.user_id,
            advisor: owner.alias().to_string(),
            client: new.client.trim().to_string(),
            reference: normalize_optional(new.reference),
            product: new.product.trim().to_string(),
            expected_amount: new.expected_amount,
            realized_amount: new.realized_amount,
            capture_date: new.capture_date.unwrap_or_else(|| now.date_naive()),
            expected_close_month: first_of_month(new.expected_close_month),
            visit_date: new.visit_date,
            category: new.category,
            status: new.status,
            probability_adjusted,
        };

        record.validate()?;
        Ok(record)
    }

    /// Check every field-level invariant of a capture.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("client", &self.client)?;
        require_text("advisor", &self.advisor)?;
        require_text("product", &self.product)?;
        require_non_negative("expected_amount", self.expected_amount)?;
        if let Some(realized) = self.realized_amount {
            require_non_negative("realized_amount", realized)?;
        }
        if self.status.is_closed() && self.realized_amount.is_none() {
            return Err(ValidationError::MissingRealizedAmount);
        }
        Ok(())
    }

    /// Apply an owner's update, enforcing the forward-only status table.
    pub fn apply(&mut self, update: CaptureUpdate) -> Result<(), FunnelError> {
        let mut next = self.clone();

        if let Some(status) = update.status {
            if !self.status.can_transition_to(status) {
                return Err(FunnelError::InvalidTransition {
                    from: self.status,
                    to: status,
                });
            }
            next.status = status;
        }
        if let Some(realized) = update.realized_amount {
            next.realized_amount = Some(realized);
        }
        if let Some(p) = update.probability_adjusted {
            next.probability_adjusted = Some(Probability::new("probability_adjusted", p)?);
        }
        if let Some(expected) = update.expected_amount {
            next.expected_amount = expected;
        }
        if let Some(month) = update.expected_close_month {
            next.expected_close_month = first_of_month(month);
        }
        if let Some(visit) = update.visit_date {
            next.visit_date = Some(visit);
        }
        if update.reference.is_some() {
            next.reference = normalize_optional(update.reference);
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
