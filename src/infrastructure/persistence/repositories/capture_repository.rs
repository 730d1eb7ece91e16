use super::{parse_decimal, parse_uuid};
use crate::domain::access::CaptureScope;
use crate::domain::funnel::{
    CaptureFilter, CaptureRecord, ClientCategory, FunnelStatus, Probability,
};
use crate::domain::repositories::CaptureRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

pub(crate) struct SqliteCaptureRepository {
    pool: SqlitePool,
}

impl SqliteCaptureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaptureRepository for SqliteCaptureRepository {
    async fn insert(&self, record: &CaptureRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO captures (
                id, created_at, user_id, advisor, client, reference, product,
                expected_amount, realized_amount, capture_date, expected_close_month,
                visit_date, category, status, probability_adjusted
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.created_at)
        .bind(record.user_id.to_string())
        .bind(&record.advisor)
        .bind(&record.client)
        .bind(&record.reference)
        .bind(&record.product)
        .bind(record.expected_amount.to_string())
        .bind(record.realized_amount.map(|d| d.to_string()))
        .bind(record.capture_date)
        .bind(record.expected_close_month)
        .bind(record.visit_date)
        .bind(record.category.to_string())
        .bind(record.status.to_string())
        .bind(record.probability_adjusted.map(|p| p.value()))
        .execute(&self.pool)
        .await
        .context("Failed to insert capture")?;

        info!("Persisted capture {} for {}", record.id, record.advisor);
        Ok(())
    }

    async fn update(&self, record: &CaptureRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE captures SET
                reference = ?,
                expected_amount = ?,
                realized_amount = ?,
                expected_close_month = ?,
                visit_date = ?,
                status = ?,
                probability_adjusted = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.reference)
        .bind(record.expected_amount.to_string())
        .bind(record.realized_amount.map(|d| d.to_string()))
        .bind(record.expected_close_month)
        .bind(record.visit_date)
        .bind(record.status.to_string())
        .bind(record.probability_adjusted.map(|p| p.value()))
        .bind(record.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update capture")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Capture {} vanished before update", record.id);
        }
        info!("Updated capture {} -> {}", record.id, record.status);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CaptureRecord>> {
        let row = sqlx::query("SELECT * FROM captures WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load capture")?;

        row.map(|r| map_row(&r)).transpose()
    }

    async fn find(&self, scope: CaptureScope, filter: &CaptureFilter) -> Result<Vec<CaptureRecord>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM captures WHERE 1 = 1");

        if let CaptureScope::Owner(user_id) = scope {
            qb.push(" AND user_id = ").push_bind(user_id.to_string());
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND capture_date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to_exclusive {
            qb.push(" AND capture_date < ").push_bind(to);
        }
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category.to_string());
        }
        if let Some(advisor) = &filter.advisor {
            qb.push(" AND advisor = ").push_bind(advisor.clone());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.to_string());
        }
        qb.push(" ORDER BY capture_date DESC, created_at DESC LIMIT ")
            .push_bind(filter.limit as i64);

        debug!("Capture query: {}", qb.sql());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query captures")?;

        rows.iter().map(map_row).collect()
    }

    async fn advisor_directory(&self) -> Result<Vec<(String, Uuid)>> {
        let rows = sqlx::query(
            r#"
            SELECT advisor, user_id FROM captures c
            WHERE created_at = (
                SELECT MAX(created_at) FROM captures latest WHERE latest.advisor = c.advisor
            )
            GROUP BY advisor
            ORDER BY advisor ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load advisor directory")?;

        let mut directory = Vec::new();
        for row in rows {
            let advisor: String = row.try_get("advisor")?;
            let user_id: String = row.try_get("user_id")?;
            directory.push((advisor, parse_uuid("user_id", &user_id)?));
        }
        Ok(directory)
    }
}

fn map_row(row: &SqliteRow) -> Result<CaptureRecord> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let expected: String = row.try_get("expected_amount")?;
    let realized: Option<String> = row.try_get("realized_amount")?;
    let category: String = row.try_get("category")?;
    let status: String = row.try_get("status")?;
    let probability: Option<f64> = row.try_get("probability_adjusted")?;

    Ok(CaptureRecord {
        id: parse_uuid("id", &id)?,
        created_at: row.try_get("created_at")?,
        user_id: parse_uuid("user_id", &user_id)?,
        advisor: row.try_get("advisor")?,
        client: row.try_get("client")?,
        reference: row.try_get("reference")?,
        product: row.try_get("product")?,
        expected_amount: parse_decimal("expected_amount", &expected)?,
        realized_amount: realized
            .map(|r| parse_decimal("realized_amount", &r))
            .transpose()?,
        capture_date: row.try_get("capture_date")?,
        expected_close_month: row.try_get("expected_close_month")?,
        visit_date: row.try_get("visit_date")?,
        category: ClientCategory::from_str(&category)?,
        status: FunnelStatus::from_str(&status)?,
        probability_adjusted: probability
            .map(|p| Probability::new("probability_adjusted", p))
            .transpose()?,
    })
}
