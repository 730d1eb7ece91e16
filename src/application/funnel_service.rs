//! Entry point for every funnel operation.
//!
//! Each call resolves the caller's role against the admin set, checks the
//! access policy, and only then touches a repository. Listings push the
//! caller's scope into the query and re-check every returned row.

use crate::application::dashboard::{Dashboard, DashboardOptions};
use crate::domain::access::{AccessPolicy, Action, CaptureScope, Resource};
use crate::domain::errors::FunnelError;
use crate::domain::funnel::{
    CaptureFilter, CaptureRecord, CaptureUpdate, ClientCategory, DEFAULT_CAPTURE_LIMIT,
    DateWindow, MonthlyGoal, NewCapture, Observation, ObservationFilter, ProductConfig,
};
use crate::domain::identity::{Identity, Requester};
use crate::domain::metrics::SemaphoreThresholds;
use crate::domain::repositories::{
    AdminRepository, CaptureRepository, GoalRepository, ObservationRepository, ProductRepository,
};
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteAdminRepository, SqliteCaptureRepository, SqliteGoalRepository,
    SqliteObservationRepository, SqliteProductRepository,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type FunnelResult<T> = Result<T, FunnelError>;

pub struct FunnelService {
    products: Arc<dyn ProductRepository>,
    captures: Arc<dyn CaptureRepository>,
    goals: Arc<dyn GoalRepository>,
    admins: Arc<dyn AdminRepository>,
    observations: Arc<dyn ObservationRepository>,
    thresholds: SemaphoreThresholds,
    capture_limit: usize,
    metrics: Metrics,
}

impl FunnelService {
    pub fn new(database: &Database, thresholds: SemaphoreThresholds, metrics: Metrics) -> Self {
        let pool = database.pool.clone();
        Self {
            products: Arc::new(SqliteProductRepository::new(pool.clone())),
            captures: Arc::new(SqliteCaptureRepository::new(pool.clone())),
            goals: Arc::new(SqliteGoalRepository::new(pool.clone())),
            admins: Arc::new(SqliteAdminRepository::new(pool.clone())),
            observations: Arc::new(SqliteObservationRepository::new(pool)),
            thresholds,
            capture_limit: DEFAULT_CAPTURE_LIMIT,
            metrics,
        }
    }

    /// Upper bound on rows fetched by any capture listing.
    pub fn with_capture_limit(mut self, limit: usize) -> Self {
        self.capture_limit = limit.max(1);
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn thresholds(&self) -> SemaphoreThresholds {
        self.thresholds
    }

    async fn requester(&self, identity: &Identity) -> FunnelResult<Requester> {
        let is_admin = self.admins.is_admin(identity.user_id).await?;
        Ok(Requester {
            user_id: identity.user_id,
            is_admin,
        })
    }

    fn authorize(
        &self,
        requester: &Requester,
        action: Action,
        resource: Resource,
    ) -> FunnelResult<()> {
        AccessPolicy::authorize(requester, action, &resource).map_err(|denied| {
            warn!(
                "Access denied for {}: {} {}",
                requester.user_id, denied.action, denied.resource
            );
            self.metrics
                .inc_access_denied(denied.resource.label(), &denied.action.to_string());
            FunnelError::from(denied)
        })
    }

    // --- Admin set ---

    pub async fn is_admin(&self, identity: &Identity) -> FunnelResult<bool> {
        let requester = self.requester(identity).await?;
        self.authorize(
            &requester,
            Action::Read,
            Resource::AdminEntry {
                user: identity.user_id,
            },
        )?;
        Ok(requester.is_admin)
    }

    /// Admins see the whole set; anyone else at most their own entry.
    pub async fn list_admins(&self, identity: &Identity) -> FunnelResult<Vec<Uuid>> {
        let requester = self.requester(identity).await?;
        let admins = self.admins.get_all().await?;
        Ok(admins
            .into_iter()
            .filter(|user| {
                AccessPolicy::is_allowed(&requester, Action::Read, &Resource::AdminEntry { user: *user })
            })
            .collect())
    }

    pub async fn grant_admin(&self, identity: &Identity, user: Uuid) -> FunnelResult<()> {
        let requester = self.requester(identity).await?;
        self.authorize(&requester, Action::Insert, Resource::AdminEntry { user })?;

        self.admins.grant(user).await?;
        self.metrics.inc_writes("admins", "insert");
        info!("Admin granted to {} by {}", user, identity.user_id);
        Ok(())
    }

    /// Returns false when the user was not an admin.
    pub async fn revoke_admin(&self, identity: &Identity, user: Uuid) -> FunnelResult<bool> {
        let requester = self.requester(identity).await?;
        self.authorize(&requester, Action::Delete, Resource::AdminEntry { user })?;

        let removed = self.admins.revoke(user).await?;
        if removed {
            self.metrics.inc_writes("admins", "delete");
            info!("Admin revoked from {} by {}", user, identity.user_id);
        }
        Ok(removed)
    }

    // --- Products ---

    pub async fn list_products(
        &self,
        identity: &Identity,
        active_only: bool,
    ) -> FunnelResult<Vec<ProductConfig>> {
        let requester = self.requester(identity).await?;
        self.authorize(&requester, Action::Read, Resource::ProductConfig)?;
        Ok(self.products.get_all(active_only).await?)
    }

    pub async fn save_product(
        &self,
        identity: &Identity,
        product: ProductConfig,
    ) -> FunnelResult<ProductConfig> {
        let requester = self.requester(identity).await?;
        self.authorize(&requester, Action::Insert, Resource::ProductConfig)?;
        let action = match self.products.find_by_name(&product.name).await? {
            Some(_) => Action::Update,
            None => Action::Insert,
        };
        self.authorize(&requester, action, Resource::ProductConfig)?;

        self.products.save(&product).await?;
        self.metrics.inc_writes("products", &action.to_string());
        info!(
            "Product {} saved (lag {} months, default probability {}, active {})",
            product.name, product.recognition_lag_months, product.default_probability, product.active
        );
        Ok(product)
    }

    // --- Captures ---

    pub async fn create_capture(
        &self,
        identity: &Identity,
        new: NewCapture,
    ) -> FunnelResult<CaptureRecord> {
        let requester = self.requester(identity).await?;
        self.authorize(
            &requester,
            Action::Insert,
            Resource::Capture {
                owner: identity.user_id,
            },
        )?;

        let product_name = new.product.trim().to_string();
        let product = self
            .products
            .find_by_name(&product_name)
            .await?
            .ok_or_else(|| FunnelError::NotFound {
                entity: "product",
                id: product_name.clone(),
            })?;
        if !product.active {
            return Err(FunnelError::InactiveProduct(product.name));
        }

        let record = CaptureRecord::create(identity, new, Utc::now())?;
        self.captures.insert(&record).await?;
        self.metrics.inc_writes("captures", "insert");
        info!(
            "Capture {} created by {} for {} ({}, {})",
            record.id, record.advisor, record.client, record.product, record.status
        );
        Ok(record)
    }

    pub async fn update_capture(
        &self,
        identity: &Identity,
        id: Uuid,
        update: CaptureUpdate,
    ) -> FunnelResult<CaptureRecord> {
        let requester = self.requester(identity).await?;
        let mut record = self.visible_capture(&requester, id).await?;
        self.authorize(
            &requester,
            Action::Update,
            Resource::Capture {
                owner: record.user_id,
            },
        )?;

        let previous = record.status;
        record.apply(update)?;
        self.captures.update(&record).await?;
        self.metrics.inc_writes("captures", "update");
        info!(
            "Capture {} updated by {} ({} -> {})",
            record.id, record.advisor, previous, record.status
        );
        Ok(record)
    }

    pub async fn get_capture(&self, identity: &Identity, id: Uuid) -> FunnelResult<CaptureRecord> {
        let requester = self.requester(identity).await?;
        self.visible_capture(&requester, id).await
    }

    pub async fn list_captures(
        &self,
        identity: &Identity,
        filter: CaptureFilter,
    ) -> FunnelResult<Vec<CaptureRecord>> {
        let requester = self.requester(identity).await?;
        self.scoped_captures(&requester, filter).await
    }

    /// Captures outside the caller's read scope are reported as missing, so
    /// ids of other advisors' captures cannot be discovered. The denial is still
    /// logged and counted.
    async fn visible_capture(&self, requester: &Requester, id: Uuid) -> FunnelResult<CaptureRecord> {
        let not_found = || FunnelError::NotFound {
            entity: "capture",
            id: id.to_string(),
        };
        let record = self.captures.find_by_id(id).await?.ok_or_else(not_found)?;
        self.authorize(
            requester,
            Action::Read,
            Resource::Capture {
                owner: record.user_id,
            },
        )
        .map_err(|_| not_found())?;
        Ok(record)
    }

    async fn scoped_captures(
        &self,
        requester: &Requester,
        mut filter: CaptureFilter,
    ) -> FunnelResult<Vec<CaptureRecord>> {
        filter.limit = filter.limit.min(self.capture_limit);
        let scope = CaptureScope::for_requester(requester);

        let records = self.captures.find(scope, &filter).await?;
        for record in &records {
            self.authorize(
                requester,
                Action::Read,
                Resource::Capture {
                    owner: record.user_id,
                },
            )?;
        }
        debug!(
            "{} captures visible to {} (admin: {})",
            records.len(),
            requester.user_id,
            requester.is_admin
        );
        Ok(records)
    }

    /// Alias to user id, one entry per advisor, from their latest capture.
    /// Advisors only find themselves.
    pub async fn advisor_directory(&self, identity: &Identity) -> FunnelResult<Vec<(String, Uuid)>> {
        let requester = self.requester(identity).await?;
        let directory = self.captures.advisor_directory().await?;
        Ok(directory
            .into_iter()
            .filter(|(_, owner)| {
                AccessPolicy::is_allowed(&requester, Action::Read, &Resource::Capture { owner: *owner })
            })
            .collect())
    }

    // --- Goals ---

    pub async fn set_goal(
        &self,
        identity: &Identity,
        advisor_id: Uuid,
        month: NaiveDate,
        amount: Decimal,
    ) -> FunnelResult<MonthlyGoal> {
        let requester = self.requester(identity).await?;
        let resource = Resource::MonthlyGoal { advisor: advisor_id };
        self.authorize(&requester, Action::Insert, resource)?;

        let goal = MonthlyGoal::new(advisor_id, month, amount)?;
        let action = match self.goals.find(advisor_id, goal.month).await? {
            Some(_) => Action::Update,
            None => Action::Insert,
        };
        self.authorize(&requester, action, resource)?;

        let saved = self.goals.upsert(&goal).await?;
        self.metrics.inc_writes("monthly_goals", &action.to_string());
        info!(
            "Goal for {} in {} set to {} by {}",
            advisor_id, saved.month, saved.amount, identity.user_id
        );
        Ok(saved)
    }

    pub async fn goal_for(
        &self,
        identity: &Identity,
        advisor_id: Uuid,
        month: NaiveDate,
    ) -> FunnelResult<Option<MonthlyGoal>> {
        let requester = self.requester(identity).await?;
        self.authorize(&requester, Action::Read, Resource::MonthlyGoal { advisor: advisor_id })?;
        Ok(self
            .goals
            .find(advisor_id, DateWindow::month(month).from)
            .await?)
    }

    /// Advisors get their own goals; admins every goal, or one advisor's.
    pub async fn list_goals(
        &self,
        identity: &Identity,
        advisor_id: Option<Uuid>,
    ) -> FunnelResult<Vec<MonthlyGoal>> {
        let requester = self.requester(identity).await?;
        let target = if requester.is_admin {
            advisor_id
        } else {
            Some(advisor_id.unwrap_or(identity.user_id))
        };
        if let Some(advisor) = target {
            self.authorize(&requester, Action::Read, Resource::MonthlyGoal { advisor })?;
        }

        let goals = self.goals.find_by_advisor(target).await?;
        for goal in &goals {
            self.authorize(
                &requester,
                Action::Read,
                Resource::MonthlyGoal {
                    advisor: goal.advisor_id,
                },
            )?;
        }
        Ok(goals)
    }

    // --- Observations ---

    /// Leave a note for the advisor known by `advisor_alias`.
    pub async fn create_observation(
        &self,
        identity: &Identity,
        advisor_alias: &str,
        client: Option<String>,
        message: &str,
    ) -> FunnelResult<Observation> {
        let requester = self.requester(identity).await?;
        let alias = advisor_alias.trim();
        let advisor_id = self
            .captures
            .advisor_directory()
            .await?
            .into_iter()
            .find(|(name, _)| name == alias)
            .map(|(_, id)| id)
            .ok_or_else(|| FunnelError::NotFound {
                entity: "advisor",
                id: alias.to_string(),
            })?;
        self.authorize(&requester, Action::Insert, Resource::Observation { advisor: advisor_id })?;

        let observation = Observation::new(
            advisor_id,
            alias,
            client,
            message,
            identity.user_id,
            Utc::now(),
        )?;
        self.observations.insert(&observation).await?;
        self.metrics.inc_writes("observations", "insert");
        info!("Observation {} left for {}", observation.id, alias);
        Ok(observation)
    }

    /// The caller's own notes that are not done yet.
    pub async fn pending_observations(&self, identity: &Identity) -> FunnelResult<Vec<Observation>> {
        self.list_observations(
            identity,
            ObservationFilter {
                advisor_id: Some(identity.user_id),
                pending_only: true,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn list_observations(
        &self,
        identity: &Identity,
        mut filter: ObservationFilter,
    ) -> FunnelResult<Vec<Observation>> {
        let requester = self.requester(identity).await?;
        if !requester.is_admin {
            filter.advisor_id = Some(filter.advisor_id.unwrap_or(identity.user_id));
        }
        if let Some(advisor) = filter.advisor_id {
            self.authorize(&requester, Action::Read, Resource::Observation { advisor })?;
        }

        let observations = self.observations.find(&filter).await?;
        for observation in &observations {
            self.authorize(
                &requester,
                Action::Read,
                Resource::Observation {
                    advisor: observation.advisor_id,
                },
            )?;
        }
        Ok(observations)
    }

    pub async fn set_observation_done(
        &self,
        identity: &Identity,
        id: Uuid,
        done: bool,
    ) -> FunnelResult<Observation> {
        let requester = self.requester(identity).await?;
        let mut observation = self.find_observation(id).await?;
        self.authorize(
            &requester,
            Action::Update,
            Resource::Observation {
                advisor: observation.advisor_id,
            },
        )?;

        observation.set_done(done, identity.user_id, Utc::now());
        self.observations.update(&observation).await?;
        self.metrics.inc_writes("observations", "update");
        info!(
            "Observation {} marked {} by {}",
            id,
            if done { "done" } else { "pending" },
            identity.user_id
        );
        Ok(observation)
    }

    pub async fn delete_observation(&self, identity: &Identity, id: Uuid) -> FunnelResult<()> {
        let requester = self.requester(identity).await?;
        let observation = self.find_observation(id).await?;
        self.authorize(
            &requester,
            Action::Delete,
            Resource::Observation {
                advisor: observation.advisor_id,
            },
        )?;

        if self.observations.delete(id).await? {
            self.metrics.inc_writes("observations", "delete");
            info!("Observation {} deleted by {}", id, identity.user_id);
        }
        Ok(())
    }

    async fn find_observation(&self, id: Uuid) -> FunnelResult<Observation> {
        self.observations
            .find_by_id(id)
            .await?
            .ok_or_else(|| FunnelError::NotFound {
                entity: "observation",
                id: id.to_string(),
            })
    }

    // --- Dashboard ---

    /// Metrics over the caller's captures logged in the month containing `month`.
    ///
    /// The goal is the caller's own for advisors and the sum of every
    /// advisor's goal for admins.
    pub async fn dashboard(
        &self,
        identity: &Identity,
        month: NaiveDate,
        category: Option<ClientCategory>,
        cumulative: bool,
    ) -> FunnelResult<Dashboard> {
        let requester = self.requester(identity).await?;
        self.authorize(&requester, Action::Read, Resource::ProductConfig)?;

        let window = DateWindow::month(month);
        let filter = CaptureFilter::window(window)
            .with_category(category)
            .with_limit(self.capture_limit);
        let records = self.scoped_captures(&requester, filter).await?;
        let products = self.products.get_all(false).await?;

        let goal = if requester.is_admin {
            let goals = self.goals.find_by_advisor(None).await?;
            let month_goals: Vec<&MonthlyGoal> =
                goals.iter().filter(|g| g.month == window.from).collect();
            if month_goals.is_empty() {
                None
            } else {
                Some(month_goals.iter().map(|g| g.amount).sum())
            }
        } else {
            self.authorize(
                &requester,
                Action::Read,
                Resource::MonthlyGoal {
                    advisor: identity.user_id,
                },
            )?;
            self.goals
                .find(identity.user_id, window.from)
                .await?
                .map(|g| g.amount)
        };

        let dashboard = Dashboard::build(
            &records,
            &products,
            goal,
            &DashboardOptions {
                window,
                thresholds: self.thresholds,
                cumulative,
                admin_view: requester.is_admin,
            },
        );
        self.metrics.record_snapshot(
            &dashboard.breakdown,
            &dashboard.totals,
            dashboard.weighted_pipeline,
        );
        Ok(dashboard)
    }
}
