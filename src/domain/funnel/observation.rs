use crate::domain::errors::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Note an admin leaves for an advisor, optionally about a specific client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub advisor_id: Uuid,
    pub advisor_alias: String,
    pub client: Option<String>,
    pub message: String,
    pub created_by: Uuid,
    pub done: bool,
    pub done_at: Option<DateTime<Utc>>,
    pub done_by: Option<Uuid>,
}

impl Observation {
    pub fn new(
        advisor_id: Uuid,
        advisor_alias: impl Into<String>,
        client: Option<String>,
        message: &str,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "message".to_string(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: now,
            advisor_id,
            advisor_alias: advisor_alias.into(),
            client: client.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            message: message.to_string(),
            created_by,
            done: false,
            done_at: None,
            done_by: None,
        })
    }

    /// Mark done (stamping who and when) or reopen (clearing both).
    pub fn set_done(&mut self, done: bool, by: Uuid, now: DateTime<Utc>) {
        self.done = done;
        if done {
            self.done_at = Some(now);
            self.done_by = Some(by);
        } else {
            self.done_at = None;
            self.done_by = None;
        }
    }
}

/// Admin-side listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationFilter {
    pub created_from: Option<NaiveDate>,
    pub created_to_exclusive: Option<NaiveDate>,
    pub advisor_id: Option<Uuid>,
    pub pending_only: bool,
}
