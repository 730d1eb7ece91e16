//! Repository Pattern Abstractions
//!
//! Storage traits for the funnel tables. They carry no authorization of their
//! own: implementations are crate-private and reached only through
//! `application::FunnelService`, which checks the access policy first.
//!
//! Capture listings still receive a [`CaptureScope`] so the row filter is
//! pushed down into the query rather than applied after fetching everything.

use crate::domain::access::CaptureScope;
use crate::domain::funnel::{
    CaptureFilter, CaptureRecord, MonthlyGoal, Observation, ObservationFilter, ProductConfig,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert or replace a product by name
    async fn save(&self, product: &ProductConfig) -> Result<()>;

    async fn find_by_name(&self, name: &str) -> Result<Option<ProductConfig>>;

    async fn get_all(&self, active_only: bool) -> Result<Vec<ProductConfig>>;
}

#[async_trait]
pub trait CaptureRepository: Send + Sync {
    async fn insert(&self, record: &CaptureRecord) -> Result<()>;

    /// Overwrite the mutable fields of an existing capture
    async fn update(&self, record: &CaptureRecord) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CaptureRecord>>;

    /// Newest first: by capture date, then creation time
    async fn find(&self, scope: CaptureScope, filter: &CaptureFilter) -> Result<Vec<CaptureRecord>>;

    /// Alias -> owner id, taken from each alias's most recent capture
    async fn advisor_directory(&self) -> Result<Vec<(String, Uuid)>>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Insert, or replace the amount of the existing (advisor, month) goal
    async fn upsert(&self, goal: &MonthlyGoal) -> Result<MonthlyGoal>;

    async fn find(&self, advisor_id: Uuid, month: NaiveDate) -> Result<Option<MonthlyGoal>>;

    async fn find_by_advisor(&self, advisor_id: Option<Uuid>) -> Result<Vec<MonthlyGoal>>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool>;

    async fn grant(&self, user_id: Uuid) -> Result<()>;

    /// Returns whether the user was an admin
    async fn revoke(&self, user_id: Uuid) -> Result<bool>;

    async fn get_all(&self) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait ObservationRepository: Send + Sync {
    async fn insert(&self, observation: &Observation) -> Result<()>;

    async fn update(&self, observation: &Observation) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Observation>>;

    async fn find(&self, filter: &ObservationFilter) -> Result<Vec<Observation>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}
