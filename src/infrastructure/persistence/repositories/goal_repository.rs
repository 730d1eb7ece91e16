use super::{parse_decimal, parse_uuid};
use crate::domain::funnel::MonthlyGoal;
use crate::domain::repositories::GoalRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

pub(crate) struct SqliteGoalRepository {
    pool: SqlitePool,
}

impl SqliteGoalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GoalRepository for SqliteGoalRepository {
    async fn upsert(&self, goal: &MonthlyGoal) -> Result<MonthlyGoal> {
        sqlx::query(
            r#"
            INSERT INTO monthly_goals (id, advisor_id, month, amount, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(advisor_id, month) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(goal.id.to_string())
        .bind(goal.advisor_id.to_string())
        .bind(goal.month)
        .bind(goal.amount.to_string())
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to save monthly goal")?;

        info!(
            "Persisted goal {} for advisor {} ({})",
            goal.amount, goal.advisor_id, goal.month
        );

        // The row keeps its original id when an existing goal was replaced
        self.find(goal.advisor_id, goal.month)
            .await?
            .context("Monthly goal missing after save")
    }

    async fn find(&self, advisor_id: Uuid, month: NaiveDate) -> Result<Option<MonthlyGoal>> {
        let row = sqlx::query("SELECT * FROM monthly_goals WHERE advisor_id = ? AND month = ?")
            .bind(advisor_id.to_string())
            .bind(month)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load monthly goal")?;

        row.map(|r| map_row(&r)).transpose()
    }

    async fn find_by_advisor(&self, advisor_id: Option<Uuid>) -> Result<Vec<MonthlyGoal>> {
        let rows = match advisor_id {
            Some(id) => {
                sqlx::query("SELECT * FROM monthly_goals WHERE advisor_id = ? ORDER BY month DESC")
                    .bind(id.to_string())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM monthly_goals ORDER BY month DESC, advisor_id ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list monthly goals")?;

        rows.iter().map(map_row).collect()
    }
}

fn map_row(row: &SqliteRow) -> Result<MonthlyGoal> {
    let id: String = row.try_get("id")?;
    let advisor_id: String = row.try_get("advisor_id")?;
    let amount: String = row.try_get("amount")?;

    Ok(MonthlyGoal {
        id: parse_uuid("id", &id)?,
        advisor_id: parse_uuid("advisor_id", &advisor_id)?,
        month: row.try_get("month")?,
        amount: parse_decimal("amount", &amount)?,
    })
}
