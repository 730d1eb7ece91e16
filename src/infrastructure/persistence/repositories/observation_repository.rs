use super::parse_uuid;
use crate::domain::funnel::{Observation, ObservationFilter};
use crate::domain::repositories::ObservationRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::info;
use uuid::Uuid;

pub(crate) struct SqliteObservationRepository {
    pool: SqlitePool,
}

impl SqliteObservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ObservationRepository for SqliteObservationRepository {
    async fn insert(&self, observation: &Observation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO observations (
                id, created_at, advisor_id, advisor_alias, client, message,
                created_by, done, done_at, done_by
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(observation.id.to_string())
        .bind(observation.created_at)
        .bind(observation.advisor_id.to_string())
        .bind(&observation.advisor_alias)
        .bind(&observation.client)
        .bind(&observation.message)
        .bind(observation.created_by.to_string())
        .bind(observation.done)
        .bind(observation.done_at)
        .bind(observation.done_by.map(|u| u.to_string()))
        .execute(&self.pool)
        .await
        .context("Failed to insert observation")?;

        info!(
            "Persisted observation {} for {}",
            observation.id, observation.advisor_alias
        );
        Ok(())
    }

    async fn update(&self, observation: &Observation) -> Result<()> {
        sqlx::query("UPDATE observations SET done = ?, done_at = ?, done_by = ? WHERE id = ?")
            .bind(observation.done)
            .bind(observation.done_at)
            .bind(observation.done_by.map(|u| u.to_string()))
            .bind(observation.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update observation")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Observation>> {
        let row = sqlx::query("SELECT * FROM observations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load observation")?;

        row.map(|r| map_row(&r)).transpose()
    }

    async fn find(&self, filter: &ObservationFilter) -> Result<Vec<Observation>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM observations WHERE 1 = 1");

        if let Some(advisor_id) = filter.advisor_id {
            qb.push(" AND advisor_id = ").push_bind(advisor_id.to_string());
        }
        if filter.pending_only {
            qb.push(" AND done = 0");
        }
        if let Some(from) = filter.created_from {
            qb.push(" AND created_at >= ")
                .push_bind(Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN)));
        }
        if let Some(to) = filter.created_to_exclusive {
            qb.push(" AND created_at < ")
                .push_bind(Utc.from_utc_datetime(&to.and_time(NaiveTime::MIN)));
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query observations")?;

        rows.iter().map(map_row).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM observations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete observation")?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_row(row: &SqliteRow) -> Result<Observation> {
    let id: String = row.try_get("id")?;
    let advisor_id: String = row.try_get("advisor_id")?;
    let created_by: String = row.try_get("created_by")?;
    let done_by: Option<String> = row.try_get("done_by")?;

    Ok(Observation {
        id: parse_uuid("id", &id)?,
        created_at: row.try_get("created_at")?,
        advisor_id: parse_uuid("advisor_id", &advisor_id)?,
        advisor_alias: row.try_get("advisor_alias")?,
        client: row.try_get("client")?,
        message: row.try_get("message")?,
        created_by: parse_uuid("created_by", &created_by)?,
        done: row.try_get("done")?,
        done_at: row.try_get("done_at")?,
        done_by: done_by.map(|u| parse_uuid("done_by", &u)).transpose()?,
    })
}
