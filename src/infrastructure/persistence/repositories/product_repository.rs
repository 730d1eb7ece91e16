use crate::domain::funnel::{Probability, ProductConfig};
use crate::domain::repositories::ProductRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

pub(crate) struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn save(&self, product: &ProductConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (name, recognition_lag_months, default_probability, active, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                recognition_lag_months = excluded.recognition_lag_months,
                default_probability = excluded.default_probability,
                active = excluded.active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.name)
        .bind(product.recognition_lag_months as i64)
        .bind(product.default_probability.value())
        .bind(product.active)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to save product config")?;

        info!("Persisted product config for {}", product.name);
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ProductConfig>> {
        let row = sqlx::query("SELECT * FROM products WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load product config")?;

        row.map(|r| map_row(&r)).transpose()
    }

    async fn get_all(&self, active_only: bool) -> Result<Vec<ProductConfig>> {
        let sql = if active_only {
            "SELECT * FROM products WHERE active = 1 ORDER BY name ASC"
        } else {
            "SELECT * FROM products ORDER BY name ASC"
        };
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list products")?;

        rows.iter().map(map_row).collect()
    }
}

fn map_row(row: &SqliteRow) -> Result<ProductConfig> {
    let lag: i64 = row.try_get("recognition_lag_months")?;
    let probability: f64 = row.try_get("default_probability")?;

    Ok(ProductConfig {
        name: row.try_get("name")?,
        recognition_lag_months: u32::try_from(lag).context("Negative recognition lag")?,
        default_probability: Probability::new("default_probability", probability)?,
        active: row.try_get("active")?,
    })
}
