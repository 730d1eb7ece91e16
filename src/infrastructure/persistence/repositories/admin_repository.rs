use super::parse_uuid;
use crate::domain::repositories::AdminRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

pub(crate) struct SqliteAdminRepository {
    pool: SqlitePool,
}

impl SqliteAdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for SqliteAdminRepository {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM admins WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to check admin set")?;
        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    async fn grant(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO admins (user_id) VALUES (?)")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to grant admin")?;

        info!("Granted admin to {}", user_id);
        Ok(())
    }

    async fn revoke(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to revoke admin")?;

        info!("Revoked admin from {}", user_id);
        Ok(result.rows_affected() > 0)
    }

    async fn get_all(&self) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT user_id FROM admins ORDER BY granted_at ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list admins")?;

        rows.iter()
            .map(|row| {
                let user_id: String = row.try_get("user_id")?;
                parse_uuid("user_id", &user_id)
            })
            .collect()
    }
}
